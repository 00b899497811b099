// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use correlatives::logging::init_logger;
use correlatives::{
    available_courses, builtin_catalog, check_records, course_reports, export_json,
    load_records, summarize, write_csv, Catalog, CatalogIssue, CatalogReport, CourseStatus,
    IssueKind, Selection,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "correlatives", version)]
#[command(about = "Track completed courses and see which ones are unlocked")]
struct Cli {
    /// Catalog file (.json or .csv); the built-in catalog is used when absent
    #[arg(long, global = true, env = "CORRELATIVES_CATALOG")]
    catalog: Option<PathBuf>,

    /// Comma-separated course ids to start the session with
    #[arg(long, global = true, value_delimiter = ',', env = "CORRELATIVES_COMPLETED")]
    completed: Vec<String>,

    /// Refuse to start when the catalog has courses that can never unlock
    #[arg(long, global = true)]
    strict: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive course table (default)
    Tui,
    /// Print available course ids, one per line
    Available,
    /// Print every course with its status
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Check the catalog for authoring defects
    Check,
    /// Export the catalog with statuses
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file; stdout when absent
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let code = run(cli, &mut io::stdout())?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Run one command, writing its output to `out`. Returns the exit status.
fn run<W: Write>(cli: Cli, out: &mut W) -> Result<i32> {
    let records = match &cli.catalog {
        Some(path) => load_records(path)?,
        None => builtin_catalog().to_records(),
    };
    let report = check_records(&records);
    let command = cli.command.unwrap_or(Command::Tui);

    if blocks_startup(cli.strict, &report, &command) {
        eprintln!("❌ Catalog has courses that can never become available:");
        print_report(&report, out)?;
        return Ok(1);
    }
    for issue in startup_warnings(&report, &command) {
        tracing::warn!(course = %issue.course_id, "{}", issue.message);
    }

    let catalog = Catalog::from_records(records);
    let mut selection = Selection::new();
    let seeded = selection.seed(&cli.completed, &catalog);
    if !seeded.unknown.is_empty() {
        eprintln!("⚠️  Unknown course ids ignored: {}", seeded.unknown.join(", "));
    }
    if !seeded.locked.is_empty() {
        eprintln!(
            "⚠️  Locked courses not marked (missing prerequisites): {}",
            seeded.locked.join(", ")
        );
    }

    match command {
        Command::Tui => return run_ui_mode(catalog, selection, out),
        Command::Available => write_available(&catalog, &selection, out)?,
        Command::Status { json } => {
            if json {
                writeln!(out, "{}", export_json(&catalog, selection.completed())?)?;
            } else {
                print_status(&catalog, &selection, out)?;
            }
        }
        Command::Export { format, output } => {
            run_export(&catalog, &selection, format, output, out)?
        }
        Command::Check => {
            print_report(&report, out)?;
            if report.has_critical_issues() {
                return Ok(1);
            }
        }
    }

    Ok(0)
}

/// `--strict` turns critical catalog issues into a start-up failure, except
/// for `check`, whose job is to report them.
fn blocks_startup(strict: bool, report: &CatalogReport, command: &Command) -> bool {
    strict && report.has_critical_issues() && !matches!(command, Command::Check)
}

fn startup_warnings<'a>(report: &'a CatalogReport, command: &Command) -> Vec<&'a CatalogIssue> {
    if matches!(command, Command::Check) {
        return Vec::new();
    }
    // Catalog::from_records already warns for each omitted duplicate
    report
        .issues
        .iter()
        .filter(|issue| !matches!(issue.kind, IssueKind::DuplicateId))
        .collect()
}

fn write_available<W: Write>(catalog: &Catalog, selection: &Selection, out: &mut W) -> Result<()> {
    for course in available_courses(selection.completed(), catalog) {
        writeln!(out, "{}", course.id)?;
    }
    Ok(())
}

fn print_report<W: Write>(report: &CatalogReport, out: &mut W) -> Result<()> {
    for issue in &report.issues {
        writeln!(out, "{:?}: {}", issue.severity, issue.message)?;
    }
    if report.is_clean() {
        writeln!(out, "✓ {}", report.summary())?;
    } else {
        writeln!(out, "{}", report.summary())?;
    }
    Ok(())
}

fn print_status<W: Write>(catalog: &Catalog, selection: &Selection, out: &mut W) -> Result<()> {
    writeln!(out, "Catalog {}", &catalog.fingerprint()[..12])?;
    writeln!(out, "{}", summarize(selection.completed(), catalog).summary())?;
    writeln!(out)?;

    for report in course_reports(catalog, selection.completed()) {
        let marker = match report.status {
            CourseStatus::Completed => "✓",
            CourseStatus::Available => "○",
            CourseStatus::Locked => "✗",
        };
        if report.missing.is_empty() {
            writeln!(out, "{} {:<9} {:<10} {}", marker, report.id, report.status, report.name)?;
        } else {
            writeln!(
                out,
                "{} {:<9} {:<10} {} (missing: {})",
                marker,
                report.id,
                report.status,
                report.name,
                report.missing.join(", ")
            )?;
        }
    }
    Ok(())
}

fn run_export<W: Write>(
    catalog: &Catalog,
    selection: &Selection,
    format: ExportFormat,
    output: Option<PathBuf>,
    out: &mut W,
) -> Result<()> {
    match (format, output) {
        (ExportFormat::Csv, Some(path)) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create export file: {:?}", path))?;
            write_csv(catalog, selection.completed(), file)?;
            eprintln!("✓ Exported {} courses to {:?}", catalog.len(), path);
        }
        (ExportFormat::Csv, None) => write_csv(catalog, selection.completed(), &mut *out)?,
        (ExportFormat::Json, Some(path)) => {
            std::fs::write(&path, export_json(catalog, selection.completed())?)
                .with_context(|| format!("Failed to write export file: {:?}", path))?;
            eprintln!("✓ Exported {} courses to {:?}", catalog.len(), path);
        }
        (ExportFormat::Json, None) => {
            writeln!(out, "{}", export_json(catalog, selection.completed())?)?
        }
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode<W: Write>(catalog: Catalog, selection: Selection, out: &mut W) -> Result<i32> {
    tracing::debug!(courses = catalog.len(), "starting terminal UI");

    let mut app = ui::App::new(catalog, selection);
    ui::run_ui(&mut app)?;

    let completed: Vec<&str> = app.selection.completed().iter().map(String::as_str).collect();
    if !completed.is_empty() {
        // Session state is not saved; print it so it can be passed back with --completed
        writeln!(out, "--completed {}", completed.join(","))?;
    }

    Ok(0)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode<W: Write>(_catalog: Catalog, _selection: Selection, _out: &mut W) -> Result<i32> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: correlatives status");
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use correlatives::CourseRecord;
    use std::path::Path;

    fn run_args(args: &[&str]) -> (i32, String) {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        let mut out = Vec::new();
        let code = run(cli, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    fn write_dangling_catalog(dir: &Path) -> String {
        let path = dir.join("plan.json");
        std::fs::write(
            &path,
            r#"[{"id": "A", "name": "Alpha"}, {"id": "B", "name": "Beta", "prerequisites": ["Z"]}]"#,
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_completed_accepts_comma_separated_ids() {
        let cli =
            Cli::try_parse_from(["correlatives", "available", "--completed", "INGM101,INGM105"])
                .unwrap();

        assert_eq!(cli.completed, vec!["INGM101", "INGM105"]);
        assert!(matches!(cli.command, Some(Command::Available)));
    }

    #[test]
    fn test_completed_falls_back_to_environment() {
        std::env::set_var("CORRELATIVES_COMPLETED", "ING6102,INGM105");
        let cli = Cli::try_parse_from(["correlatives", "status"]);
        std::env::remove_var("CORRELATIVES_COMPLETED");

        assert_eq!(cli.unwrap().completed, vec!["ING6102", "INGM105"]);
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["correlatives", "--strict"]).unwrap();

        assert!(cli.command.is_none());
        assert!(cli.strict);
    }

    #[test]
    fn test_export_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["correlatives", "export", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_available_prints_ids_in_catalog_order() {
        let (code, out) = run_args(&[
            "correlatives",
            "--completed",
            "ING6102,INGM105,INGM101",
            "available",
        ]);

        assert_eq!(code, 0);
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            vec!["ING6301", "INGM102", "INGM106", "ING6201", "INGM107", "INGF101"]
        );
    }

    #[test]
    fn test_check_builtin_catalog_exits_zero() {
        let (code, out) = run_args(&["correlatives", "check"]);

        assert_eq!(code, 0);
        assert!(out.starts_with("✓ 16 courses, 0 issues"));
    }

    #[test]
    fn test_check_exits_one_on_dangling_prerequisite() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_dangling_catalog(dir.path());

        let (code, out) = run_args(&["correlatives", "--catalog", &catalog, "check"]);

        assert_eq!(code, 1);
        assert!(out.contains("2 courses, 1 issues (1 critical)"));
    }

    #[test]
    fn test_strict_refuses_dangling_catalog_except_for_check() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_dangling_catalog(dir.path());

        let (code, out) = run_args(&["correlatives", "--catalog", &catalog, "available"]);
        assert_eq!(code, 0);
        assert_eq!(out.lines().collect::<Vec<_>>(), vec!["A"]);

        let (code, out) =
            run_args(&["correlatives", "--catalog", &catalog, "--strict", "available"]);
        assert_eq!(code, 1);
        assert!(!out.lines().any(|line| line == "A"));

        let (code, out) = run_args(&["correlatives", "--catalog", &catalog, "--strict", "check"]);
        assert_eq!(code, 1);
        assert!(out.contains("1 critical"));
    }

    #[test]
    fn test_startup_warnings_skip_duplicates_and_check() {
        let records = vec![
            CourseRecord {
                id: "A".into(),
                name: "Alpha".into(),
                prerequisites: None,
            },
            CourseRecord {
                id: "A".into(),
                name: "Again".into(),
                prerequisites: None,
            },
            CourseRecord {
                id: "B".into(),
                name: "Beta".into(),
                prerequisites: Some(vec!["Z".into()]),
            },
        ];
        let report = check_records(&records);
        assert_eq!(report.issues.len(), 2);

        let warned = startup_warnings(&report, &Command::Available);
        assert_eq!(warned.len(), 1);
        assert!(matches!(warned[0].kind, IssueKind::DanglingPrerequisite { .. }));

        assert!(startup_warnings(&report, &Command::Check).is_empty());
    }

    #[test]
    fn test_status_json_lists_every_course() {
        let (code, out) = run_args(&["correlatives", "status", "--json"]);

        assert_eq!(code, 0);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 16);
    }
}
