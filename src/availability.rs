// 🔓 Availability Engine - Which courses can be taken right now
//
// Pure derivation: (completed set, catalog) → available courses.
// Nothing here is stored; every status is recomputed from the completed set.

use crate::catalog::{Catalog, Course};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// ============================================================================
// COMPLETED SET
// ============================================================================

/// Anything that can answer "has this course been completed?"
pub trait CompletedSet {
    fn is_completed(&self, id: &str) -> bool;
}

impl CompletedSet for BTreeSet<String> {
    fn is_completed(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl CompletedSet for HashSet<String> {
    fn is_completed(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl<T: CompletedSet + ?Sized> CompletedSet for &T {
    fn is_completed(&self, id: &str) -> bool {
        (**self).is_completed(id)
    }
}

// ============================================================================
// COURSE STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    /// Marked as done by the user
    Completed,

    /// Not completed, every prerequisite completed
    Available,

    /// Not completed, at least one prerequisite missing
    Locked,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Completed => "completed",
            CourseStatus::Available => "available",
            CourseStatus::Locked => "locked",
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

fn prerequisites_met<S: CompletedSet + ?Sized>(course: &Course, completed: &S) -> bool {
    course
        .prerequisites
        .iter()
        .all(|prereq| completed.is_completed(prereq))
}

/// Derived status of a single course.
pub fn status_of<S: CompletedSet + ?Sized>(course: &Course, completed: &S) -> CourseStatus {
    if completed.is_completed(&course.id) {
        CourseStatus::Completed
    } else if prerequisites_met(course, completed) {
        CourseStatus::Available
    } else {
        CourseStatus::Locked
    }
}

// ============================================================================
// AVAILABILITY
// ============================================================================

/// Courses that are not completed and whose prerequisites are all completed,
/// in catalog order.
///
/// A prerequisite id that does not exist in the catalog can never be
/// completed through the UI, so its dependents stay locked.
pub fn available_courses<'a, S: CompletedSet + ?Sized>(
    completed: &S,
    catalog: &'a Catalog,
) -> Vec<&'a Course> {
    catalog
        .iter()
        .filter(|course| !completed.is_completed(&course.id))
        .filter(|course| prerequisites_met(course, completed))
        .collect()
}

/// Same as [`available_courses`], ids only.
pub fn available_ids<S: CompletedSet + ?Sized>(completed: &S, catalog: &Catalog) -> Vec<String> {
    available_courses(completed, catalog)
        .into_iter()
        .map(|course| course.id.clone())
        .collect()
}

/// Prerequisites of `course` that are still missing, in prerequisite order.
pub fn missing_prerequisites<'a, S: CompletedSet + ?Sized>(
    course: &'a Course,
    completed: &S,
) -> Vec<&'a str> {
    if completed.is_completed(&course.id) {
        return Vec::new();
    }

    course
        .prerequisites
        .iter()
        .filter(|prereq| !completed.is_completed(prereq))
        .map(|prereq| prereq.as_str())
        .collect()
}

/// Courses that would become available if `course_id` were completed now.
///
/// Only courses that directly require `course_id` and are missing nothing
/// else qualify. Empty when `course_id` is already completed.
pub fn unlocked_by<'a>(
    course_id: &str,
    completed: &BTreeSet<String>,
    catalog: &'a Catalog,
) -> Vec<&'a Course> {
    if completed.contains(course_id) {
        return Vec::new();
    }

    let mut with_course = completed.clone();
    with_course.insert(course_id.to_string());

    catalog
        .iter()
        .filter(|course| course.requires(course_id))
        .filter(|course| status_of(*course, completed) == CourseStatus::Locked)
        .filter(|course| status_of(*course, &with_course) == CourseStatus::Available)
        .collect()
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub completed: usize,
    pub available: usize,
    pub locked: usize,
    pub total: usize,
}

impl StatusSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} courses: {} completed, {} available, {} locked",
            self.total, self.completed, self.available, self.locked
        )
    }
}

pub fn summarize<S: CompletedSet + ?Sized>(completed: &S, catalog: &Catalog) -> StatusSummary {
    let mut summary = StatusSummary {
        total: catalog.len(),
        ..StatusSummary::default()
    };

    for course in catalog {
        match status_of(course, completed) {
            CourseStatus::Completed => summary.completed += 1,
            CourseStatus::Available => summary.available += 1,
            CourseStatus::Locked => summary.locked += 1,
        }
    }

    summary
}

// ============================================================================
// TESTS
// ============================================================================
