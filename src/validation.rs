// 🔍 Catalog Checks - Authoring defects, reported not enforced
//
// The engine tolerates every defect found here (a dangling prerequisite just
// locks its course forever). Checks exist so authors can find them; `--strict`
// turns critical ones into a start-up failure.
//
// Prerequisite cycles are out of scope and not detected.

use crate::catalog::{Catalog, CourseRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Course can never become available
    Warning,  // Entry ignored or questionable
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    DanglingPrerequisite { prerequisite: String },
    DuplicateId,
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogIssue {
    pub severity: Severity,
    pub course_id: String,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogReport {
    pub course_count: usize,
    pub issues: Vec<CatalogIssue>,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} courses, {} issues ({} critical)",
            self.course_count,
            self.issues.len(),
            self.issues
                .iter()
                .filter(|i| i.severity == Severity::Critical)
                .count()
        )
    }
}

/// Check raw records, before duplicates are dropped by the catalog build.
pub fn check_records(records: &[CourseRecord]) -> CatalogReport {
    let mut issues = Vec::new();
    let defined: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        if !seen.insert(record.id.as_str()) {
            issues.push(CatalogIssue {
                severity: Severity::Warning,
                course_id: record.id.clone(),
                kind: IssueKind::DuplicateId,
                message: format!("{} is defined more than once; later definition omitted", record.id),
            });
            continue;
        }

        if record.name.trim().is_empty() {
            issues.push(CatalogIssue {
                severity: Severity::Warning,
                course_id: record.id.clone(),
                kind: IssueKind::EmptyName,
                message: format!("{} has no display name", record.id),
            });
        }

        for prereq in record.prerequisites.iter().flatten() {
            if !defined.contains(prereq.as_str()) {
                issues.push(CatalogIssue {
                    severity: Severity::Critical,
                    course_id: record.id.clone(),
                    kind: IssueKind::DanglingPrerequisite {
                        prerequisite: prereq.clone(),
                    },
                    message: format!(
                        "{} requires unknown course {}; it can never become available",
                        record.id, prereq
                    ),
                });
            }
        }
    }

    CatalogReport {
        course_count: seen.len(),
        issues,
    }
}

pub fn check_catalog(catalog: &Catalog) -> CatalogReport {
    check_records(&catalog.to_records())
}

// ============================================================================
// TESTS
// ============================================================================
