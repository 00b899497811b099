// Correlatives - Core Library
// Course catalog, availability engine and completion state, shared by the
// TUI and the non-interactive commands.

pub mod catalog;
pub mod availability;
pub mod selection;
pub mod loader;
pub mod validation;
pub mod logging;

// Re-export commonly used types
pub use catalog::{builtin_catalog, Catalog, CatalogBuilder, Course, CourseRecord, CourseRef};
pub use availability::{
    available_courses, available_ids, missing_prerequisites, status_of, summarize, unlocked_by,
    CompletedSet, CourseStatus, StatusSummary,
};
pub use selection::{SeedReport, Selection, ToggleEvent, ToggleOutcome};
pub use loader::{
    course_reports, export_json, load_catalog, load_records, write_csv, CatalogFormat,
    CourseReport,
};
pub use validation::{check_catalog, check_records, CatalogIssue, CatalogReport, IssueKind, Severity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
