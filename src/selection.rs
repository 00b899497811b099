// ✅ Selection - The user's completed set + toggle rules
//
// Per-course state (completed / available / locked) is always derived from
// the completed set at the moment of the click, never cached.

use crate::availability::{missing_prerequisites, status_of, CourseStatus};
use crate::catalog::{Catalog, Course};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// TOGGLE OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Was available, now completed
    Completed,

    /// Was completed, now removed from the completed set
    Uncompleted,

    /// Course is locked; nothing changed
    Ignored { missing: Vec<String> },

    /// Id is not in the catalog; nothing changed
    Unknown,
}

impl ToggleOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, ToggleOutcome::Completed | ToggleOutcome::Uncompleted)
    }
}

/// One state change in the current session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleEvent {
    pub course_id: String,
    pub outcome: ToggleOutcome,
    pub at: DateTime<Utc>,
}

/// Ids passed to [`Selection::seed`] that could not be marked completed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub applied: Vec<String>,
    pub locked: Vec<String>,
    pub unknown: Vec<String>,
}

impl SeedReport {
    pub fn is_clean(&self) -> bool {
        self.locked.is_empty() && self.unknown.is_empty()
    }
}

// ============================================================================
// SELECTION
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Selection {
    completed: BTreeSet<String>,
    history: Vec<ToggleEvent>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing completed set, no rules applied
    pub fn with_completed<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection {
            completed: ids.into_iter().map(Into::into).collect(),
            history: Vec::new(),
        }
    }

    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    pub fn status(&self, course: &Course) -> CourseStatus {
        status_of(course, &self.completed)
    }

    pub fn history(&self) -> &[ToggleEvent] {
        &self.history
    }

    /// Apply a click on `course_id`.
    ///
    /// completed → uncompleted, available → completed, locked → no-op.
    pub fn toggle(&mut self, course_id: &str, catalog: &Catalog) -> ToggleOutcome {
        let course = match catalog.get(course_id) {
            Some(course) => course,
            None => {
                tracing::debug!(course = course_id, "toggle ignored: unknown course");
                return ToggleOutcome::Unknown;
            }
        };

        let outcome = match self.status(course) {
            CourseStatus::Completed => {
                self.completed.remove(course_id);
                ToggleOutcome::Uncompleted
            }
            CourseStatus::Available => {
                self.completed.insert(course_id.to_string());
                ToggleOutcome::Completed
            }
            CourseStatus::Locked => {
                let missing = missing_prerequisites(course, &self.completed)
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>();
                tracing::debug!(course = course_id, ?missing, "toggle ignored: course locked");
                return ToggleOutcome::Ignored { missing };
            }
        };

        tracing::debug!(course = course_id, ?outcome, "toggled");
        self.record(course_id, outcome.clone());
        outcome
    }

    /// Mark `ids` completed at start-up, through the same rules as a click.
    ///
    /// Input order does not matter: passes repeat until no further id can be
    /// applied. Already-completed ids are left as they are.
    pub fn seed<I, S>(&mut self, ids: I, catalog: &Catalog) -> SeedReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = SeedReport::default();
        let mut pending: Vec<String> = Vec::new();

        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() || self.is_completed(id) || pending.iter().any(|p| p == id) {
                continue;
            }
            if catalog.contains(id) {
                pending.push(id.to_string());
            } else {
                report.unknown.push(id.to_string());
            }
        }

        loop {
            let before = pending.len();
            pending.retain(|id| {
                let available = catalog
                    .get(id)
                    .map(|course| status_of(course, &self.completed) == CourseStatus::Available)
                    .unwrap_or(false);
                if available {
                    self.completed.insert(id.clone());
                    self.history.push(ToggleEvent {
                        course_id: id.clone(),
                        outcome: ToggleOutcome::Completed,
                        at: Utc::now(),
                    });
                    report.applied.push(id.clone());
                }
                !available
            });
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        report.locked = pending;
        report
    }

    /// Remove every completed course
    pub fn clear(&mut self) {
        let removed = std::mem::take(&mut self.completed);
        for id in removed {
            self.record(&id, ToggleOutcome::Uncompleted);
        }
    }

    fn record(&mut self, course_id: &str, outcome: ToggleOutcome) {
        self.history.push(ToggleEvent {
            course_id: course_id.to_string(),
            outcome,
            at: Utc::now(),
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================
