use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use std::collections::BTreeMap;
use merge_traits::{ConcatError, PdfConcatenator};
use std::io::Write;
use std::path::PathBuf;

/// Concatenates PDFs page by page with lopdf.
///
/// Every input is loaded before anything is written, so an unreadable
/// input leaves the sink untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfConcatenator;

impl LopdfConcatenator {
    fn load_all(inputs: &[PathBuf]) -> Result<Vec<Document>, ConcatError> {
        inputs
            .iter()
            .map(|path| {
                Document::load(path).map_err(|e| ConcatError::Input {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Folds `documents` into one, keeping their pages in order.
    ///
    /// Each page takes over the attributes it inherited from its own page
    /// tree, then all pages are hung under one fresh `/Pages` node.
    pub fn merge(documents: Vec<Document>) -> Result<Document, ConcatError> {
        let mut max_id = 1;
        let mut pages: Vec<(ObjectId, Dictionary)> = vec![];
        let mut objects = BTreeMap::new();

        for mut doc in documents {
            doc.renumber_objects_with(max_id);
            max_id = doc.max_id + 1;

            for (_, page_id) in doc.get_pages() {
                let mut page = doc
                    .get_dictionary(page_id)
                    .map_err(|e| ConcatError::Output(e.to_string()))?
                    .clone();
                inherit_attributes(&doc, &mut page);
                pages.push((page_id, page));
            }
            objects.extend(doc.objects);
        }

        let mut merged = Document::with_version("1.5");
        let mut catalog: Option<(ObjectId, Dictionary)> = None;

        for (id, object) in objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" => {
                    // first catalog wins, its id is reused for the merged one
                    if catalog.is_none() {
                        if let Ok(dict) = object.as_dict() {
                            catalog = Some((id, dict.clone()));
                        }
                    }
                }
                // input page trees are replaced by a single new node,
                // outlines would point at stale ids
                b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    merged.objects.insert(id, object);
                }
            }
        }

        let (catalog_id, mut catalog) =
            catalog.ok_or_else(|| ConcatError::Output("no catalog found".to_string()))?;
        if pages.is_empty() {
            return Err(ConcatError::Output("no pages found".to_string()));
        }

        let tree_id = (max_id, 0);
        let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
        let count = pages.len() as i64;

        for (id, mut page) in pages {
            page.set("Parent", tree_id);
            merged.objects.insert(id, Object::Dictionary(page));
        }

        merged.objects.insert(
            tree_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        catalog.set("Pages", tree_id);
        catalog.remove(b"Outlines");
        merged.objects.insert(catalog_id, Object::Dictionary(catalog));

        merged.trailer.set("Root", catalog_id);
        merged.max_id = max_id;
        merged.renumber_objects();
        merged.adjust_zero_pages();
        merged.compress();

        Ok(merged)
    }
}

/// Page attributes a page may leave to one of its `/Pages` ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Nesting limit for page trees, guards against `Parent` cycles.
const MAX_TREE_DEPTH: usize = 64;

/// Copies every inheritable attribute `page` lacks from the nearest
/// ancestor that defines it.
fn inherit_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
}

impl PdfConcatenator for LopdfConcatenator {
    fn concatenate(&self, inputs: &[PathBuf], sink: &mut dyn Write) -> Result<(), ConcatError> {
        let documents = Self::load_all(inputs)?;
        debug!("Loaded {} documents for merge", documents.len());

        let mut merged = Self::merge(documents)?;

        let mut buf = Vec::new();
        merged
            .save_to(&mut buf)
            .map_err(|e| ConcatError::Output(e.to_string()))?;
        sink.write_all(&buf)?;
        sink.flush()?;
        Ok(())
    }
}
