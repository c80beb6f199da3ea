use super::Workspace;
use crate::archive::assemble::{assemble, output_span};
use crate::archive::resolve::resolve;
use crate::id_range::IdSpan;
use crate::pdf::merge::merge_to;
use crate::pdf::text::{iso_date, parse_iso_date};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;

#[derive(Debug, Default)]
pub struct MergeOptions {
    pub ids: String,
    /// `YYYY-MM-DD`, or `today`.
    pub date: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub dry_run: bool,
    pub keep: bool,
}

/// Everything decided before the first write.
#[derive(Debug)]
pub struct MergePlan {
    pub inputs: Vec<PathBuf>,
    pub span: IdSpan,
    pub output: PathBuf,
}

pub fn plan(ws: &Workspace, options: &MergeOptions) -> Result<MergePlan> {
    let ids = ws.parse_ids(&options.ids)?;
    let snapshot = ws.snapshot()?;
    let resolved = resolve(&ids, &snapshot);
    let inputs = assemble(&resolved);

    let sources: Vec<_> = snapshot
        .scans()
        .iter()
        .filter(|scan| inputs.contains(&scan.path))
        .collect();

    let span = match output_span(&resolved, sources.iter().filter_map(|scan| scan.span())) {
        Some(span) if !inputs.is_empty() => span,
        _ => anyhow::bail!("No scan with id {} found", options.ids),
    };

    let not_pdf: Vec<_> = sources.iter().filter(|scan| !scan.name.is_pdf()).collect();
    if !not_pdf.is_empty() {
        let names: Vec<_> = not_pdf
            .iter()
            .map(|scan| scan.path.display().to_string())
            .collect();
        anyhow::bail!(
            "Not yet converted to PDF, run convert first: {}",
            names.join(", ")
        );
    }

    let date = match options.date.as_deref() {
        Some(raw) => Some(document_date(raw)?),
        None => sources.iter().find_map(|scan| scan.name.date.clone()),
    };
    let title = options
        .title
        .clone()
        .or_else(|| sources.iter().find_map(|scan| scan.name.description.clone()));
    let category = options
        .category
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| ws.config.archive.default_category.clone());

    let file_name = ws
        .codec
        .document_name(date.as_deref(), span, title.as_deref(), "pdf");
    let output = ws.dir.join(category).join(file_name);
    if output.exists() {
        anyhow::bail!("Refusing to overwrite {}", output.display());
    }

    Ok(MergePlan {
        inputs,
        span,
        output,
    })
}

pub fn run(ws: &Workspace, options: &MergeOptions) -> Result<()> {
    let plan = plan(ws, options)?;

    println!("will merge following scans:");
    for input in &plan.inputs {
        println!("  {}", input.display());
    }
    println!("into {}", plan.output.display());

    if options.dry_run {
        return Ok(());
    }

    if let Some(parent) = plan.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create category: {}", parent.display()))?;
    }
    let pages = merge_to(&plan.inputs, &plan.output)?;
    info!(span = %plan.span, pages, output = %plan.output.display(), "merged");

    if !options.keep {
        let unique: BTreeSet<_> = plan.inputs.iter().collect();
        for input in unique {
            std::fs::remove_file(input)
                .with_context(|| format!("Failed to remove merged scan: {}", input.display()))?;
        }
    }

    Ok(())
}

fn document_date(raw: &str) -> Result<String> {
    if raw == "today" {
        return Ok(iso_date(OffsetDateTime::now_utc().date()));
    }
    parse_iso_date(raw)
        .map(iso_date)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD or today", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_util::touch;
    use crate::commands::next_id::{compute, NextIdOptions};
    use crate::commands::test_workspace;
    use crate::pdf::merge::test_pdf::write_blank_pdf;

    #[test]
    fn test_plan_names_the_output() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["out00011.pdf", "2023-07-01_00012_Lease.pdf"]);
        let ws = test_workspace(dir.path());

        let plan = plan(
            &ws,
            &MergeOptions {
                ids: "11+".into(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(plan.span, IdSpan { first: 11, last: 12 });
        assert_eq!(
            plan.output,
            dir.path().join("_toSort").join("2023-07-01_00011+_Lease.pdf")
        );
        assert_eq!(plan.inputs.len(), 2);
    }

    #[test]
    fn test_plan_rejects_images_and_empty_selections() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["out00001.png", "out00002.pdf"]);
        let ws = test_workspace(dir.path());

        let opts = |ids: &str| MergeOptions {
            ids: ids.into(),
            ..Default::default()
        };
        let err = plan(&ws, &opts("1+")).unwrap_err();
        assert!(err.to_string().contains("convert"));
        assert!(plan(&ws, &opts("9")).is_err());
        assert!(plan(&ws, &opts("2")).is_ok());
    }

    #[test]
    fn test_merge_writes_and_removes_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_blank_pdf(&dir.path().join("out00001.pdf"), 1);
        write_blank_pdf(&dir.path().join("out00003.pdf"), 1);
        let ws = test_workspace(dir.path());

        let options = MergeOptions {
            ids: "1-4".into(),
            date: Some("2024-01-31".into()),
            title: Some("Tax".into()),
            category: Some("finance/tax".into()),
            ..Default::default()
        };
        run(&ws, &options).unwrap();

        let output = dir.path().join("finance/tax/2024-01-31_00001-00004_Tax.pdf");
        assert_eq!(lopdf::Document::load(&output).unwrap().get_pages().len(), 2);
        assert!(!dir.path().join("out00001.pdf").exists());
        assert!(!dir.path().join("out00003.pdf").exists());
    }

    #[test]
    fn test_output_keeps_every_id_of_its_sources() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["00011-00014_Lease.pdf"]);
        let ws = test_workspace(dir.path());

        let plan = plan(
            &ws,
            &MergeOptions {
                ids: "12".into(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(plan.span, IdSpan { first: 11, last: 14 });
        assert_eq!(
            plan.output,
            dir.path().join("_toSort").join("00011-00014_Lease.pdf")
        );
    }

    #[test]
    fn test_merged_ids_stay_allocated() {
        let dir = tempfile::tempdir().unwrap();
        write_blank_pdf(&dir.path().join("out00001.pdf"), 1);
        write_blank_pdf(&dir.path().join("out00002.pdf"), 1);
        let ws = test_workspace(dir.path());
        let next = || compute(&ws, &NextIdOptions::default()).unwrap();
        assert_eq!(next(), "3");

        let options = MergeOptions {
            ids: "1+".into(),
            title: Some("Bill".into()),
            ..Default::default()
        };
        run(&ws, &options).unwrap();
        assert!(dir.path().join("_toSort/00001+_Bill.pdf").exists());
        assert_eq!(next(), "3");
    }

    #[test]
    fn test_dates_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["out00001.pdf"]);
        let ws = test_workspace(dir.path());
        let with_date = |date: &str| MergeOptions {
            ids: "1".into(),
            date: Some(date.into()),
            ..Default::default()
        };

        let err = plan(&ws, &with_date("03/02")).unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
        assert!(plan(&ws, &with_date("2024-02-30")).is_err());

        let plan = plan(&ws, &with_date("2024-3-5")).unwrap();
        assert_eq!(
            plan.output,
            dir.path().join("_toSort").join("2024-03-05_00001.pdf")
        );
        assert!(document_date("today").is_ok());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_blank_pdf(&dir.path().join("out00001.pdf"), 1);
        let ws = test_workspace(dir.path());

        let options = MergeOptions {
            ids: "1".into(),
            dry_run: true,
            ..Default::default()
        };
        run(&ws, &options).unwrap();
        assert!(dir.path().join("out00001.pdf").exists());
        assert!(!dir.path().join("_toSort").exists());
    }
}
