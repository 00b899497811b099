// 📂 Catalog Files - Load catalogs from JSON/CSV, export status reports
//
// JSON: array of {"id", "name", "prerequisites"?}
// CSV:  header id,name,prerequisites - prerequisites separated by ';'

use crate::availability::{missing_prerequisites, status_of, CompletedSet, CourseStatus};
use crate::catalog::{Catalog, CourseRecord};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Separator between prerequisite ids inside a single CSV cell
pub const PREREQUISITE_SEPARATOR: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Csv,
}

impl CatalogFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(CatalogFormat::Json),
            Some("csv") => Ok(CatalogFormat::Csv),
            _ => bail!(
                "Unsupported catalog file {:?} (expected .json or .csv)",
                path
            ),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Read raw records from a catalog file, without building a catalog.
///
/// Kept separate from [`load_catalog`] so checks can see duplicates that
/// the catalog build would omit.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<CourseRecord>> {
    let path = path.as_ref();
    let format = CatalogFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {:?}", path))?;

    let records = match format {
        CatalogFormat::Json => parse_json(&content)
            .with_context(|| format!("Failed to parse catalog JSON: {:?}", path))?,
        CatalogFormat::Csv => parse_csv(content.as_bytes())
            .with_context(|| format!("Failed to parse catalog CSV: {:?}", path))?,
    };

    tracing::info!(path = ?path, records = records.len(), "catalog file loaded");
    Ok(records)
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    Ok(Catalog::from_records(load_records(path)?))
}

pub fn parse_json(content: &str) -> Result<Vec<CourseRecord>> {
    let records: Vec<CourseRecord> = serde_json::from_str(content)?;
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    name: String,
    #[serde(default)]
    prerequisites: Option<String>,
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<CourseRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize::<CsvRow>().enumerate() {
        // +2: header line, 1-based
        let row = result.with_context(|| format!("Invalid catalog row at line {}", index + 2))?;

        let prerequisites: Vec<String> = row
            .prerequisites
            .unwrap_or_default()
            .split(PREREQUISITE_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        records.push(CourseRecord {
            id: row.id,
            name: row.name,
            prerequisites: if prerequisites.is_empty() {
                None
            } else {
                Some(prerequisites)
            },
        });
    }

    Ok(records)
}

// ============================================================================
// EXPORT
// ============================================================================

/// One course with its derived status, as exported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseReport {
    pub id: String,
    pub name: String,
    pub prerequisites: Vec<String>,
    pub status: CourseStatus,
    pub missing: Vec<String>,
}

pub fn course_reports<S: CompletedSet + ?Sized>(catalog: &Catalog, completed: &S) -> Vec<CourseReport> {
    catalog
        .iter()
        .map(|course| CourseReport {
            id: course.id.clone(),
            name: course.name.clone(),
            prerequisites: course.prerequisites.clone(),
            status: status_of(course, completed),
            missing: missing_prerequisites(course, completed)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect()
}

pub fn export_json<S: CompletedSet + ?Sized>(catalog: &Catalog, completed: &S) -> Result<String> {
    serde_json::to_string_pretty(&course_reports(catalog, completed))
        .context("Failed to serialize course report")
}

#[derive(Debug, Serialize)]
struct CsvExportRow<'a> {
    id: &'a str,
    name: &'a str,
    prerequisites: String,
    status: &'static str,
}

pub fn write_csv<S, W>(catalog: &Catalog, completed: &S, writer: W) -> Result<()>
where
    S: CompletedSet + ?Sized,
    W: Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    let separator = PREREQUISITE_SEPARATOR.to_string();

    for course in catalog {
        wtr.serialize(CsvExportRow {
            id: &course.id,
            name: &course.name,
            prerequisites: course.prerequisites.join(&separator),
            status: status_of(course, completed).as_str(),
        })?;
    }

    wtr.flush().context("Failed to write CSV export")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
