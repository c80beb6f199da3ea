use super::Workspace;
use crate::archive::resolve::{resolve, ResolvedPage};
use anyhow::Result;

/// Print the ID sequence an expression selects.
pub fn run_ids(ws: &Workspace, expr: &str) -> Result<()> {
    let ids = ws.parse_ids(expr)?;
    let list: Vec<_> = ids.iter().map(u32::to_string).collect();
    println!("{}", list.join(","));
    Ok(())
}

pub fn resolve_expr(ws: &Workspace, expr: &str) -> Result<Vec<ResolvedPage>> {
    let ids = ws.parse_ids(expr)?;
    let snapshot = ws.snapshot()?;
    Ok(resolve(&ids, &snapshot))
}

/// Print each selected ID with its file, or `absent`.
pub fn run_resolve(ws: &Workspace, expr: &str) -> Result<()> {
    for page in resolve_expr(ws, expr)? {
        match &page.path {
            Some(path) => println!("{}\t{}", page.id, path.display()),
            None => println!("{}\tabsent", page.id),
        }
    }
    Ok(())
}
