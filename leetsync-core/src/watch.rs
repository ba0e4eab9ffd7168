//! Page observer: polls a [`PageSource`] and turns fresh accepted
//! submissions into offers or publishes.
//!
//! One poll is: snapshot → detect → extract → either publish right away
//! (auto-commit) or surface a [`PushOffer`]. A submission is consumed once
//! extraction succeeds.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::contract::{DifficultySource, PageSource, RepoHost, SolutionRecord};
use crate::detect::{Detection, Detector, Page, PushOffer};
use crate::extract::extract_solution;
use crate::publish::{push_solution, PublishOptions, PublishReceipt};
use crate::store::StateStore;

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub interval: Duration,
    /// Stop after this many polls; `None` polls forever.
    pub max_polls: Option<u64>,
    pub publish: PublishOptions,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_polls: None,
            publish: PublishOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Detected and extracted, waiting for the user to push.
    Offered {
        detection: Detection,
        offer: PushOffer,
        record: SolutionRecord,
    },
    Published {
        detection: Detection,
        receipt: PublishReceipt,
    },
    ExtractionFailed {
        detection: Detection,
        reason: String,
    },
    PublishFailed {
        detection: Detection,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchReport {
    pub polls: u64,
    pub events: Vec<WatchEvent>,
}

pub struct Watcher<'a, P: ?Sized, D: ?Sized, H: ?Sized> {
    pages: &'a P,
    difficulty: &'a D,
    host: &'a H,
    store: &'a StateStore,
    options: WatchOptions,
    detector: Detector,
}

impl<'a, P, D, H> Watcher<'a, P, D, H>
where
    P: PageSource + ?Sized,
    D: DifficultySource + ?Sized,
    H: RepoHost + ?Sized,
{
    pub fn new(
        pages: &'a P,
        difficulty: &'a D,
        host: &'a H,
        store: &'a StateStore,
        options: WatchOptions,
    ) -> Self {
        Self {
            pages,
            difficulty,
            host,
            store,
            options,
            detector: Detector::new(),
        }
    }

    /// Clears remembered offers, as after leaving the page.
    pub fn reset(&mut self) {
        self.detector.reset();
    }

    pub async fn poll_once(&mut self) -> Option<WatchEvent> {
        let snapshot = match self.pages.snapshot().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = ?e, "[WATCH] Failed to read page, will retry next poll");
                return None;
            }
        };

        let (detection, offer) = {
            let page = Page::parse(&snapshot);
            let detection = self.detector.check(&page)?;
            (detection, PushOffer::for_page(&page))
        };

        // Only a successful extraction consumes the submission; a page whose
        // code has not rendered yet is retried on the next poll.
        let record = match extract_solution(&snapshot, self.difficulty).await {
            Ok(r) => {
                self.detector.mark_offered(&detection.url);
                r
            }
            Err(e) => {
                error!(url = %detection.url, error = %e, "[WATCH] Failed to extract solution data");
                return Some(WatchEvent::ExtractionFailed {
                    detection,
                    reason: e.to_string(),
                });
            }
        };

        let auto_commit = match self.store.load() {
            Ok(state) => state.config.auto_commit,
            Err(e) => {
                warn!(error = %e, "[WATCH] Could not read settings, not auto-committing");
                false
            }
        };

        if !(auto_commit && offer.enabled) {
            info!(title = %record.problem_title, enabled = offer.enabled, "[WATCH] Push offered");
            return Some(WatchEvent::Offered {
                detection,
                offer,
                record,
            });
        }

        match push_solution(self.host, self.store, &record, self.options.publish).await {
            Ok(receipt) => Some(WatchEvent::Published { detection, receipt }),
            Err(e) => {
                error!(error = %e, "[WATCH] Error pushing solution");
                Some(WatchEvent::PublishFailed {
                    detection,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Polls at the configured interval until `max_polls` is reached.
    pub async fn run<F>(&mut self, mut on_event: F) -> WatchReport
    where
        F: FnMut(&WatchEvent),
    {
        info!(interval_ms = self.options.interval.as_millis() as u64, "[WATCH] Starting to monitor for successful submissions");
        let mut ticker = tokio::time::interval(self.options.interval);
        let mut report = WatchReport::default();

        loop {
            if let Some(max) = self.options.max_polls {
                if report.polls >= max {
                    break;
                }
            }
            ticker.tick().await;
            report.polls += 1;

            if let Some(event) = self.poll_once().await {
                on_event(&event);
                report.events.push(event);
            }
        }

        info!(polls = report.polls, events = report.events.len(), "[WATCH] Stopped");
        report
    }
}
