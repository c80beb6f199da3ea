use super::Workspace;
use crate::archive::ScanFile;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

/// One OCR invocation turning an image scan into a PDF next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

impl ConvertJob {
    /// Shell form of the job, including removal of the source image.
    pub fn shell_line(&self) -> String {
        let mut words = vec![quote(&self.program)];
        words.extend(self.args.iter().map(|a| quote(a)));
        format!(
            "{} && rm {}",
            words.join(" "),
            quote(&self.input.display().to_string())
        )
    }
}

fn quote(word: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./+=:,".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

fn job_for(ws: &Workspace, scan: &ScanFile) -> ConvertJob {
    let cfg = &ws.config.convert;
    let output = scan.path.with_extension("pdf");
    let mut args = cfg.extra_args.clone();
    args.extend([
        "-l".to_string(),
        cfg.ocr_langs.join("+"),
        "--jobs".to_string(),
        "1".to_string(),
        scan.path.display().to_string(),
        output.display().to_string(),
    ]);
    ConvertJob {
        input: scan.path.clone(),
        output,
        program: cfg.ocr_program.clone(),
        args,
    }
}

/// Plan OCR jobs for image scans, optionally limited to the IDs of `expr`.
pub fn plan(ws: &Workspace, expr: Option<&str>) -> Result<Vec<ConvertJob>> {
    let ids = expr.map(|e| ws.parse_ids(e)).transpose()?;
    let snapshot = ws.snapshot()?;
    let scans = match &ids {
        Some(ids) => snapshot.lookup(ids),
        None => snapshot.scans().iter().collect(),
    };

    let mut jobs = Vec::new();
    for scan in scans {
        if scan.name.is_pdf() || scan.name.is_digital() {
            continue;
        }
        let job = job_for(ws, scan);
        if job.output.exists() {
            warn!(output = %job.output.display(), "already converted, skipping");
            continue;
        }
        jobs.push(job);
    }
    Ok(jobs)
}

pub fn run(ws: &Workspace, expr: Option<&str>, execute: bool) -> Result<()> {
    let jobs = plan(ws, expr)?;
    if !execute {
        for job in &jobs {
            println!("{}", job.shell_line());
        }
        return Ok(());
    }

    for job in &jobs {
        info!(input = %job.input.display(), "converting");
        let status = Command::new(&job.program)
            .args(&job.args)
            .status()
            .with_context(|| format!("Failed to start {}", job.program))?;
        if !status.success() {
            anyhow::bail!(
                "Failed to run command, exited with {}: {}",
                status,
                job.shell_line()
            );
        }
        std::fs::remove_file(&job.input)
            .with_context(|| format!("Failed to remove converted scan: {}", job.input.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_util::touch;
    use crate::commands::test_workspace;

    #[test]
    fn test_plan_only_images() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["out00001.png", "out00002.pdf", "out00003.jpg", "out00004.png", "out00004.pdf"],
        );
        let ws = test_workspace(dir.path());

        let jobs = plan(&ws, None).unwrap();
        let inputs: Vec<_> = jobs.iter().map(|j| j.input.clone()).collect();
        assert_eq!(
            inputs,
            vec![dir.path().join("out00001.png"), dir.path().join("out00003.jpg")]
        );

        let jobs = plan(&ws, Some("3")).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].output, dir.path().join("out00003.pdf"));
        assert!(jobs[0].args.contains(&"deu+eng".to_string()));
    }

    #[test]
    fn test_shell_line_quotes() {
        let job = ConvertJob {
            input: PathBuf::from("my scan.png"),
            output: PathBuf::from("my scan.pdf"),
            program: "ocrmypdf".into(),
            args: vec!["-l".into(), "deu+eng".into(), "my scan.png".into()],
        };
        assert_eq!(
            job.shell_line(),
            "ocrmypdf -l deu+eng 'my scan.png' && rm 'my scan.png'"
        );
    }
}
