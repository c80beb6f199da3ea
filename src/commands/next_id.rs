use super::Workspace;
use crate::archive::alloc::{next_id, next_odd_id};
use anyhow::Result;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct NextIdOptions {
    /// Allocate for a front/back pair: the ID must be odd.
    pub pair: bool,
    pub force: Option<u32>,
    /// Print a filename with this extension instead of the bare ID.
    pub extension: Option<String>,
}

pub fn compute(ws: &Workspace, options: &NextIdOptions) -> Result<String> {
    let id = match options.force {
        Some(0) => anyhow::bail!("Forced id must be at least 1"),
        Some(id) => {
            info!(id, "using forced id");
            id
        }
        None => {
            let snapshot = ws.archive_snapshot()?;
            if options.pair {
                let odd = next_odd_id(&snapshot);
                if let Some(skipped) = odd.skipped {
                    warn!(skipped, "id left unused so the sheet starts on a front side");
                }
                odd.id
            } else {
                next_id(&snapshot)
            }
        }
    };

    Ok(match &options.extension {
        Some(ext) => ws.codec.encode(id, ext),
        None => id.to_string(),
    })
}

pub fn run(ws: &Workspace, options: &NextIdOptions) -> Result<()> {
    println!("{}", compute(ws, options)?);
    Ok(())
}
