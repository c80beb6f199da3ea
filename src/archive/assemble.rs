use super::resolve::ResolvedPage;
use crate::id_range::IdSpan;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Turn resolved pages into the ordered file list handed to the merge step.
///
/// Absent pages are dropped. A file covering several IDs is listed once for
/// them; it is listed again only when one of its IDs is requested again,
/// which starts a new run of that file.
pub fn assemble(resolved: &[ResolvedPage]) -> Vec<PathBuf> {
    // IDs each file has supplied in its current run
    let mut supplied: HashMap<&PathBuf, HashSet<u32>> = HashMap::new();
    let mut files = Vec::new();
    for page in resolved {
        let Some(path) = &page.path else {
            continue;
        };
        let run = supplied.entry(path).or_default();
        if run.is_empty() {
            files.push(path.clone());
        } else if run.contains(&page.id) {
            files.push(path.clone());
            run.clear();
        }
        run.insert(page.id);
    }
    files
}

/// ID span of the assembled document, used to name it.
///
/// Covers every present ID and the whole span of every file merged, so no
/// ID of a source disappears from the archive. Anything longer than one
/// sheet is widened to whole sheets.
pub fn output_span(
    resolved: &[ResolvedPage],
    file_spans: impl IntoIterator<Item = IdSpan>,
) -> Option<IdSpan> {
    let present = resolved
        .iter()
        .filter(|p| !p.is_absent())
        .map(|p| IdSpan::single(p.id));
    let span = present.chain(file_spans).reduce(|a, b| IdSpan {
        first: a.first.min(b.first),
        last: a.last.max(b.last),
    })?;
    if span.id_count() > 2 {
        Some(span.align())
    } else {
        Some(span)
    }
}
