use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use std::path::Path;

/// Builds a small text PDF with one page per entry in `pages`.
pub fn make_pdf(pages: &[&str]) -> Vec<u8> {
    build(pages, None)
}

/// Like [make_pdf], but `MediaBox` and `Resources` live on the `/Pages`
/// node and every page inherits them.
pub fn make_pdf_with_tree_box(pages: &[&str], media_box: [i64; 4]) -> Vec<u8> {
    build(pages, Some(media_box))
}

fn build(pages: &[&str], tree_box: Option<[i64; 4]>) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };

    let mut kids: Vec<Object> = vec![];
    for text in pages {
        let content = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if tree_box.is_none() {
            page.set("MediaBox", vec![0.into(), 0.into(), 612.into(), 792.into()]);
            page.set("Resources", resources.clone());
        }
        kids.push(doc.add_object(page).into());
    }

    let mut tree: Dictionary = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
    };
    if let Some(media_box) = tree_box {
        tree.set(
            "MediaBox",
            media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
        );
        tree.set("Resources", resources);
    }
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn write_pdf(path: &Path, pages: &[&str]) {
    std::fs::write(path, make_pdf(pages)).unwrap();
}
