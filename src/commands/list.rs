use super::Workspace;
use crate::archive::{categories, ScanFile};
use crate::pdf::text::{common_words, extract_text, find_dates};
use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Id,
    Path,
    Title,
    Date,
    Content,
    IdPath,
    IdTitle,
    IdDateTitle,
}

/// Text of a scan. Image scans have none until converted.
fn scan_text(scan: &ScanFile) -> String {
    if !scan.name.is_pdf() {
        return String::new();
    }
    extract_text(&scan.path).unwrap_or_else(|err| {
        warn!(path = %scan.path.display(), "{err:#}");
        String::new()
    })
}

fn id_label(scan: &ScanFile) -> String {
    scan.span()
        .map(|span| span.to_string())
        .unwrap_or_else(|| "d".to_string())
}

fn title_or_content(scan: &ScanFile) -> String {
    match &scan.name.description {
        Some(desc) => desc.clone(),
        None => {
            let words = common_words(&scan_text(scan), 6);
            if words.is_empty() {
                scan.title()
            } else {
                words.join(",")
            }
        }
    }
}

pub fn format_scan(scan: &ScanFile, format: ListFormat) -> Result<String> {
    let line = match format {
        ListFormat::Id => id_label(scan),
        ListFormat::Path => scan.path.display().to_string(),
        ListFormat::Title => title_or_content(scan),
        ListFormat::Date => find_dates(&scan_text(scan))?
            .into_iter()
            .next()
            .unwrap_or_default(),
        ListFormat::Content => scan_text(scan),
        ListFormat::IdPath => format!("{:>12}  {}", id_label(scan), scan.path.display()),
        ListFormat::IdTitle => format!("{:>12}  {}", id_label(scan), title_or_content(scan)),
        ListFormat::IdDateTitle => format!(
            "{:>12}  {:<10}  {}",
            id_label(scan),
            scan.name.date.as_deref().unwrap_or(""),
            title_or_content(scan)
        ),
    };
    Ok(line)
}

fn print_scans<'a>(scans: impl IntoIterator<Item = &'a ScanFile>, format: ListFormat) -> Result<()> {
    for scan in scans {
        println!("{}", format_scan(scan, format)?);
    }
    Ok(())
}

pub fn run_list(ws: &Workspace, format: ListFormat) -> Result<()> {
    let snapshot = ws.snapshot()?;
    print_scans(snapshot.scans(), format)
}

/// List the files touching any ID of `expr`, ordered by ID.
pub fn run_by_id(ws: &Workspace, expr: &str, format: ListFormat) -> Result<()> {
    let ids = ws.parse_ids(expr)?;
    let snapshot = ws.snapshot()?;
    print_scans(snapshot.lookup(&ids), format)
}

/// Print groups of files sharing an ID. Returns whether any were found.
pub fn run_check_duplicates(ws: &Workspace, format: ListFormat) -> Result<bool> {
    let snapshot = ws.archive_snapshot()?;
    let duplicates = snapshot.overlapping();
    for (i, (_, files)) in duplicates.iter().enumerate() {
        if i > 0 {
            println!("---");
        }
        print_scans(files.iter().copied(), format)?;
    }
    Ok(!duplicates.is_empty())
}

/// Print each run of sheets whose front side has no file: `N+` for a single
/// sheet, `A-B` for longer runs.
pub fn run_missing_ids(ws: &Workspace) -> Result<()> {
    let snapshot = ws.archive_snapshot()?;
    for run in snapshot.missing_sheets() {
        println!("{run}");
    }
    Ok(())
}

pub fn run_categories(ws: &Workspace) -> Result<()> {
    let found = categories(&ws.dir)
        .with_context(|| format!("Failed to list categories in {}", ws.dir.display()))?;
    for category in found {
        println!("{category}");
    }
    Ok(())
}
