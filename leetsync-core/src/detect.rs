//! Accepted-submission detection over page snapshots.
//!
//! The page is judged by several independent heuristics (see [`Strategy`]),
//! tried in order; the first hit wins. [`Detector`] wraps them with the
//! one-shot bookkeeping that keeps a submission from being offered twice no
//! matter how often the page is re-observed.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::contract::PageSnapshot;
use crate::extract::url_path;

const ACCEPTED_SELECTORS: &[&str] = &[
    r#"[data-e2e-locator="submission-result"]"#,
    ".submission-result",
    r#"[class*="accepted"]"#,
    r#"[class*="success"]"#,
];

const SUCCESS_WORDS: &[&str] = &["accepted", "success", "correct"];
const METRIC_WORDS: &[&str] = &["runtime", "memory", "ms", "mb"];

const RESULT_SELECTORS: &[&str] = &[
    r#"[data-e2e-locator="submission-result"]"#,
    ".submission-result",
    ".result-container",
];

const TOP_BAR_SELECTORS: &[&str] = &[
    ".flex.justify-between.items-center",
    ".submission-header",
    ".problem-header",
];

pub const DISABLED_HINT: &str = "Please submit your solution before pushing to GitHub.";
pub const ENABLED_HINT: &str = "Push your solution to GitHub repository";

fn submission_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/problems/[^/]+/submissions/\d+").expect("static regex"))
}

fn valid_submission_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://leetcode\.com/problems/[^/]+/submissions/\d+/?$").expect("static regex")
    })
}

fn runtime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)runtime[:\s]*\d+\s*ms").expect("static regex"))
}

fn memory_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)memory[:\s]*\d+\.?\d*\s*mb").expect("static regex"))
}

/// True when the URL points at a single submission of a problem.
pub fn is_submission_url(url: &str) -> bool {
    submission_path_re().is_match(url)
}

fn submission_page_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/problems/[^/]+/submissions/\d+/?$").expect("static regex"))
}

/// True when the URL's whole path is a single submission, ignoring host,
/// query and fragment. Gates the push offer.
pub fn is_submission_page_path(url: &str) -> bool {
    submission_page_path_re().is_match(&url_path(url))
}

/// Stricter than [`is_submission_url`]: the whole URL must be a LeetCode
/// submission page. Code is only ever scraped from such pages.
pub fn is_valid_submission_page(url: &str) -> bool {
    valid_submission_re().is_match(url)
}

/// A parsed snapshot. Not `Send`; keep it out of `.await` points.
pub struct Page {
    pub url: String,
    pub doc: Html,
}

impl Page {
    pub fn parse(snapshot: &PageSnapshot) -> Self {
        Self {
            url: snapshot.url.clone(),
            doc: Html::parse_document(&snapshot.html),
        }
    }

    /// Text of the whole document, like `textContent` on the root.
    pub fn text(&self) -> String {
        self.doc.root_element().text().collect()
    }

    pub(crate) fn select_texts(&self, selector: &str) -> Vec<String> {
        match Selector::parse(selector) {
            Ok(sel) => self
                .doc
                .select(&sel)
                .map(|el| el.text().collect::<String>())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub(crate) fn has_match(&self, selector: &str) -> bool {
        Selector::parse(selector)
            .map(|sel| self.doc.select(&sel).next().is_some())
            .unwrap_or(false)
    }
}

/// The heuristic that recognised the accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    AcceptedStatus,
    SuccessElement,
    RuntimeMemoryStats,
    SubmissionUrl,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::AcceptedStatus,
        Strategy::SuccessElement,
        Strategy::RuntimeMemoryStats,
        Strategy::SubmissionUrl,
    ];

    pub fn matches(self, page: &Page) -> bool {
        match self {
            Strategy::AcceptedStatus => check_accepted_status(page),
            Strategy::SuccessElement => check_success_element(page),
            Strategy::RuntimeMemoryStats => check_runtime_memory_stats(page),
            Strategy::SubmissionUrl => check_submission_url(page),
        }
    }
}

fn check_accepted_status(page: &Page) -> bool {
    ACCEPTED_SELECTORS.iter().any(|selector| {
        let hit = page
            .select_texts(selector)
            .iter()
            .any(|text| text.to_lowercase().contains("accepted"));
        if hit {
            debug!(selector, "Found accepted status");
        }
        hit
    })
}

// The root's text contains every descendant's, so one pass over it answers
// "does any element carry both a success word and a metric".
fn check_success_element(page: &Page) -> bool {
    let text = page.text().to_lowercase();
    SUCCESS_WORDS.iter().any(|w| text.contains(w)) && METRIC_WORDS.iter().any(|w| text.contains(w))
}

fn check_runtime_memory_stats(page: &Page) -> bool {
    let text = page.text();
    runtime_re().is_match(&text) && memory_re().is_match(&text)
}

fn check_submission_url(page: &Page) -> bool {
    is_submission_url(&page.url) && page.text().to_lowercase().contains("accepted")
}

/// Runs every strategy in order and returns the first that matches.
pub fn detect_accepted(page: &Page) -> Option<Strategy> {
    Strategy::ALL.into_iter().find(|s| s.matches(page))
}

/// A fresh accepted submission, reported once per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub url: String,
    pub strategy: Strategy,
}

/// Where on the page the push affordance would be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    NearResult(&'static str),
    NearMetrics,
    TopBar(&'static str),
    PageEnd,
}

/// The push affordance for a detected submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOffer {
    pub enabled: bool,
    pub hint: &'static str,
    pub anchor: Anchor,
}

impl PushOffer {
    pub fn for_page(page: &Page) -> Self {
        let enabled = is_submission_page_path(&page.url);
        Self {
            enabled,
            hint: if enabled { ENABLED_HINT } else { DISABLED_HINT },
            anchor: place_anchor(page),
        }
    }
}

fn place_anchor(page: &Page) -> Anchor {
    if let Some(sel) = RESULT_SELECTORS.iter().find(|s| page.has_match(s)) {
        return Anchor::NearResult(*sel);
    }
    let text = page.text().to_lowercase();
    if text.contains("runtime") && text.contains("memory") && text.contains("ms") {
        return Anchor::NearMetrics;
    }
    if let Some(sel) = TOP_BAR_SELECTORS.iter().find(|s| page.has_match(s)) {
        return Anchor::TopBar(*sel);
    }
    Anchor::PageEnd
}

fn submission_key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Remembers which submissions already got an offer.
///
/// Observing the same submission again is a no-op until [`Detector::reset`]
/// runs or the page navigates to a different URL.
#[derive(Debug, Default)]
pub struct Detector {
    offered: HashSet<String>,
    last_url: Option<String>,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a fresh accepted submission without remembering it. Call
    /// [`Detector::mark_offered`] once the offer has actually been made, so a
    /// page that is not fully rendered yet is looked at again next poll.
    pub fn check(&mut self, page: &Page) -> Option<Detection> {
        if self.last_url.as_deref() != Some(page.url.as_str()) {
            if self.last_url.is_some() {
                info!(url = %page.url, "[WATCH] URL changed, clearing previous offers");
                self.reset();
            }
            self.last_url = Some(page.url.clone());
        }

        if self.has_offered(&page.url) {
            debug!(url = %page.url, "Offer already shown, skipping");
            return None;
        }

        let strategy = detect_accepted(page)?;
        info!(url = %page.url, ?strategy, "[WATCH] Successful submission detected");
        Some(Detection {
            url: page.url.clone(),
            strategy,
        })
    }

    pub fn mark_offered(&mut self, url: &str) {
        self.offered.insert(submission_key(url));
    }

    /// [`Detector::check`] and [`Detector::mark_offered`] in one step.
    pub fn observe(&mut self, page: &Page) -> Option<Detection> {
        let detection = self.check(page)?;
        self.mark_offered(&detection.url);
        Some(detection)
    }

    pub fn reset(&mut self) {
        self.offered.clear();
    }

    pub fn has_offered(&self, url: &str) -> bool {
        self.offered.contains(&submission_key(url))
    }
}
