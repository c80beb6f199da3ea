use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::archive::alloc::{next_id, next_odd_id};
use crate::archive::resolve::resolve;
use crate::commands::Workspace;
use crate::config::Config;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NextIdRequest {
    #[schemars(description = "Archive directory")]
    pub dir: String,
    #[schemars(description = "Allocate for a front/back pair, so the id is odd (default: false)")]
    #[serde(default)]
    pub pair: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolveIdsRequest {
    #[schemars(description = "Archive directory")]
    pub dir: String,
    #[schemars(description = "Id expression (e.g., '453+,88+', '869++', '100#', '3-9')")]
    pub ids: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListScansRequest {
    #[schemars(description = "Archive directory")]
    pub dir: String,
    #[schemars(description = "Optional id expression limiting the listing")]
    #[serde(default)]
    pub ids: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArchiveServer {
    tool_router: ToolRouter<Self>,
}

impl ArchiveServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for ArchiveServer {
    fn default() -> Self {
        Self::new()
    }
}

fn open_workspace(dir: &str) -> Result<Workspace> {
    let dir = Path::new(dir);
    let config = Config::resolve(None, dir)?;
    Workspace::open(dir, config, false)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

#[tool_router]
impl ArchiveServer {
    #[tool(description = "Compute the next unused scan id of an archive directory")]
    fn next_id(&self, Parameters(req): Parameters<NextIdRequest>) -> String {
        let result = open_workspace(&req.dir).and_then(|ws| {
            let snapshot = ws.archive_snapshot()?;
            Ok(if req.pair {
                let odd = next_odd_id(&snapshot);
                NextIdResult {
                    id: odd.id,
                    skipped: odd.skipped,
                    filename: ws.codec.encode(odd.id, "png"),
                }
            } else {
                let id = next_id(&snapshot);
                NextIdResult {
                    id,
                    skipped: None,
                    filename: ws.codec.encode(id, "png"),
                }
            })
        });
        match result {
            Ok(r) => to_json(&r),
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Expand an id expression and map each id to its file (null when absent), keeping order and duplicates")]
    fn resolve_ids(&self, Parameters(req): Parameters<ResolveIdsRequest>) -> String {
        let result = open_workspace(&req.dir).and_then(|ws| {
            let ids = ws.parse_ids(&req.ids)?;
            let snapshot = ws.snapshot()?;
            Ok(resolve(&ids, &snapshot)
                .into_iter()
                .map(|page| ResolvedPageResult {
                    id: page.id,
                    path: page.path.map(|p| p.display().to_string()),
                })
                .collect::<Vec<_>>())
        });
        match result {
            Ok(r) => to_json(&r),
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "List the scan files of an archive directory, optionally only those touching an id expression")]
    fn list_scans(&self, Parameters(req): Parameters<ListScansRequest>) -> String {
        let result = open_workspace(&req.dir).and_then(|ws| {
            let snapshot = ws.snapshot()?;
            let scans = match &req.ids {
                Some(expr) => snapshot.lookup(&ws.parse_ids(expr)?),
                None => snapshot.scans().iter().collect(),
            };
            Ok(scans
                .into_iter()
                .map(|scan| ScanResult {
                    path: scan.path.display().to_string(),
                    first_id: scan.span().map(|s| s.first),
                    last_id: scan.span().map(|s| s.last),
                    date: scan.name.date.clone(),
                    description: scan.name.description.clone(),
                })
                .collect::<Vec<_>>())
        });
        match result {
            Ok(r) => to_json(&r),
            Err(e) => format!("Error: {:#}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NextIdResult {
    pub id: u32,
    pub skipped: Option<u32>,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResolvedPageResult {
    pub id: u32,
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScanResult {
    pub path: String,
    pub first_id: Option<u32>,
    pub last_id: Option<u32>,
    pub date: Option<String>,
    pub description: Option<String>,
}

#[tool_handler]
impl ServerHandler for ArchiveServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Scan archive tools. Use next_id to get the id for the next scanned page, \
                 resolve_ids to expand an id expression into files, and list_scans to see \
                 what the archive holds."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = ArchiveServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
