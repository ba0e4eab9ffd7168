//! Scrapes a [`SolutionRecord`] out of an accepted submission page.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;
use tracing::{debug, error, info, warn};

use crate::contract::{DifficultySource, PageSnapshot, SolutionRecord};
use crate::detect::{is_valid_submission_page, Page};
use crate::error::ExtractError;

const TITLE_SELECTORS: &[&str] = &[
    r#"[data-cy="question-title"]"#,
    ".css-v3d350",
    r#"h1[class*="title"]"#,
    "h1",
    ".question-title",
    r#"[class*="title"]"#,
];

const TITLE_REJECT_WORDS: &[&str] = &["solution", "submit", "accepted"];
const MAX_TITLE_LEN: usize = 200;

const CODE_SELECTOR: &str = ".px-4.py-3 pre code";

const LANGUAGE_SELECTORS: &[&str] = &[
    "[data-mode]",
    ".lang-selector",
    ".language-selector",
    r#"[class*="language"]"#,
    r#"[class*="lang"]"#,
];

const KNOWN_LANGUAGES: &[&str] = &[
    "javascript",
    "python",
    "java",
    "cpp",
    "c++",
    "c#",
    "go",
    "rust",
    "typescript",
];

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

fn problem_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"problems/(\d+)-").expect("static regex"))
}

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"problems/([\w-]+)(?:/|$)").expect("static regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("static regex"))
}

fn runtime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)runtime[:\s]*([\d.]+)\s*ms.*?beats\s*([\d.]+)%").expect("static regex")
    })
}

fn memory_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)memory[:\s]*([\d.]+)\s*mb.*?beats\s*([\d.]+)%").expect("static regex")
    })
}

/// Path component of a URL; the input itself when it does not parse.
pub fn url_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}

/// Problem slug (`two-sum`) from a problem or submission URL.
pub fn problem_slug(url: &str) -> Option<String> {
    slug_re()
        .captures(&url_path(url))
        .map(|caps| caps[1].to_string())
}

fn with_problem_number(url: &str, title: String) -> String {
    match problem_number_re().captures(url) {
        Some(caps) => format!("{}. {}", &caps[1], title),
        None => title,
    }
}

fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn extract_title(page: &Page) -> Option<String> {
    for selector in TITLE_SELECTORS {
        for text in page.select_texts(selector) {
            let text = text.trim();
            if text.is_empty() || text.len() >= MAX_TITLE_LEN {
                continue;
            }
            let lower = text.to_lowercase();
            if TITLE_REJECT_WORDS.iter().any(|w| lower.contains(w)) {
                continue;
            }
            debug!(selector, title = text, "Title found");
            return Some(with_problem_number(&page.url, text.to_string()));
        }
    }

    let path = url_path(&page.url);
    let slug = path.split('/').find(|part| part.contains('-') && part.len() > 3)?;
    debug!(slug, "Title derived from URL slug");
    Some(with_problem_number(&page.url, title_case_slug(slug)))
}

/// Submitted code, only from a valid submission page.
pub fn extract_code(page: &Page) -> Option<String> {
    if !is_valid_submission_page(&page.url) {
        warn!(url = %page.url, "Not a valid submission page, code extraction skipped");
        return None;
    }

    let selector = Selector::parse(CODE_SELECTOR).ok()?;
    let Some(element) = page.doc.select(&selector).next() else {
        warn!(url = %page.url, "Code block not found");
        return None;
    };

    let raw: String = element.text().collect();
    let normalised = raw.replace("\r\n", "\n");
    let code = blank_lines_re().replace_all(&normalised, "\n").trim().to_string();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

fn language_in_text(text: &str) -> Option<&'static str> {
    KNOWN_LANGUAGES
        .iter()
        .find(|lang| text.contains(*lang))
        .map(|lang| if *lang == "cpp" { "c++" } else { *lang })
}

fn language_from_control(text: &str) -> Option<&'static str> {
    if text.contains("javascript") || text.contains("js") {
        Some("javascript")
    } else if text.contains("python") {
        Some("python")
    } else if text.contains("java") {
        Some("java")
    } else if text.contains("c++") || text.contains("cpp") {
        Some("c++")
    } else if text.contains("c#") {
        Some("c#")
    } else if text.contains("go") {
        Some("go")
    } else if text.contains("rust") {
        Some("rust")
    } else {
        None
    }
}

pub fn extract_language(page: &Page) -> String {
    for selector in LANGUAGE_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let Some(element) = page.doc.select(&sel).next() else {
            continue;
        };
        if let Some(mode) = element.value().attr("data-mode") {
            return mode.to_lowercase();
        }
        let text = element.text().collect::<String>().to_lowercase();
        if let Some(lang) = language_in_text(&text) {
            return lang.to_string();
        }
    }

    if let Ok(controls) = Selector::parse("button, select, option") {
        for control in page.doc.select(&controls) {
            let text = control.text().collect::<String>().to_lowercase();
            if let Some(lang) = language_from_control(&text) {
                return lang.to_string();
            }
        }
    }

    "unknown".to_string()
}

/// Runtime and memory lines, formatted as `3 ms (beats 97.5%)`.
pub fn extract_metrics(page: &Page) -> (Option<String>, Option<String>) {
    let text = page.text().to_lowercase();
    let runtime = runtime_re()
        .captures(&text)
        .map(|caps| format!("{} ms (beats {}%)", &caps[1], &caps[2]));
    let memory = memory_re()
        .captures(&text)
        .map(|caps| format!("{} MB (beats {}%)", &caps[1], &caps[2]));
    (runtime, memory)
}

/// The page-only part of a record; owns everything so the parsed page can be
/// dropped before the difficulty lookup awaits.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    pub problem_title: String,
    pub code: String,
    pub language: String,
    pub runtime: Option<String>,
    pub memory: Option<String>,
    pub url: String,
    pub slug: Option<String>,
}

pub fn scrape_page(snapshot: &PageSnapshot) -> Result<ScrapedPage, ExtractError> {
    let page = Page::parse(snapshot);

    let problem_title = extract_title(&page).ok_or_else(|| {
        error!(url = %page.url, "Could not extract problem title");
        ExtractError::MissingTitle
    })?;
    let code = extract_code(&page).ok_or_else(|| {
        error!(url = %page.url, "Could not extract solution code");
        ExtractError::MissingCode
    })?;
    let language = extract_language(&page);
    let (runtime, memory) = extract_metrics(&page);

    debug!(title = %problem_title, code_len = code.len(), language = %language, "Scraped page");
    Ok(ScrapedPage {
        problem_title,
        code,
        language,
        runtime,
        memory,
        url: page.url.clone(),
        slug: problem_slug(&page.url),
    })
}

/// Difficulty for `slug`; any failure degrades to `"Unknown"`.
pub async fn resolve_difficulty<D>(source: &D, slug: Option<&str>) -> String
where
    D: DifficultySource + ?Sized,
{
    let Some(slug) = slug else {
        return UNKNOWN.to_string();
    };
    match source.fetch_difficulty(slug).await {
        Ok(difficulty) if !difficulty.trim().is_empty() => {
            debug!(slug, difficulty = %difficulty, "Fetched difficulty");
            difficulty
        }
        Ok(_) => UNKNOWN.to_string(),
        Err(e) => {
            error!(slug, error = ?e, "Failed to fetch difficulty");
            UNKNOWN.to_string()
        }
    }
}

/// Full extraction: scrape the page, then look up the difficulty.
pub async fn extract_solution<D>(
    snapshot: &PageSnapshot,
    difficulty_source: &D,
) -> Result<SolutionRecord, ExtractError>
where
    D: DifficultySource + ?Sized,
{
    info!(url = %snapshot.url, "Extracting solution data");
    let scraped = scrape_page(snapshot)?;
    let difficulty = resolve_difficulty(difficulty_source, scraped.slug.as_deref()).await;

    let language = if scraped.language.is_empty() {
        UNKNOWN.to_string()
    } else {
        scraped.language
    };

    Ok(SolutionRecord {
        problem_title: scraped.problem_title,
        difficulty,
        code: scraped.code.trim().to_string(),
        language,
        runtime: scraped.runtime.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        memory: scraped.memory.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        url: scraped.url,
        complexity: None,
    })
}
