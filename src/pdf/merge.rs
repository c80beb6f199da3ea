use anyhow::{Context, Result};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Concatenate the pages of `inputs`, in the given order, into one document.
///
/// The same file may appear more than once; each occurrence contributes its
/// pages again.
pub fn merge_files<P: AsRef<Path>>(inputs: &[P]) -> Result<Document> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for input in inputs {
        let input = input.as_ref();
        let mut doc = Document::load(input)
            .with_context(|| format!("Failed to load PDF: {}", input.display()))?;

        // Renumber object IDs to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            let page = doc
                .get_object(page_id)
                .with_context(|| format!("Broken page object in {}", input.display()))?
                .to_owned();
            pages.push((page_id, page));
        }
        debug!(input = %input.display(), pages = pages.len(), "loaded");
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut pages_root: Option<(ObjectId, Object)> = None;

    for (object_id, object) in objects {
        let kind = object.type_name().map(|t| t.to_vec()).unwrap_or_default();
        match kind.as_slice() {
            b"Catalog" => {
                if catalog.is_none() {
                    catalog = Some((object_id, object));
                }
            }
            b"Pages" => {
                if pages_root.is_none() {
                    pages_root = Some((object_id, object));
                }
            }
            // pages are re-inserted below, outlines would point into dropped trees
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, pages_obj) = pages_root.context("No page tree found in input PDFs")?;
    let (catalog_id, catalog_obj) = catalog.context("No catalog found in input PDFs")?;

    let count = pages.len();
    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();

    for (page_id, page) in pages {
        if let Object::Dictionary(mut dict) = page {
            dict.set("Parent", Object::Reference(pages_id));
            merged.objects.insert(page_id, Object::Dictionary(dict));
        }
    }

    let mut pages_dict = pages_obj
        .as_dict()
        .context("Page tree root is not a dictionary")?
        .clone();
    pages_dict.set("Count", Object::Integer(count as i64));
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.remove(b"Parent");
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog_dict = catalog_obj
        .as_dict()
        .context("Catalog is not a dictionary")?
        .clone();
    catalog_dict.set("Pages", Object::Reference(pages_id));
    catalog_dict.remove(b"Outlines");
    merged
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = merged.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}

/// Merge `inputs` and write the result to `output`. Returns the page count.
pub fn merge_to<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<usize> {
    let output = output.as_ref();
    let mut merged = merge_files(inputs)?;
    let total_pages = merged.get_pages().len();
    merged
        .save(output)
        .with_context(|| format!("Failed to save merged PDF: {}", output.display()))?;
    Ok(total_pages)
}
