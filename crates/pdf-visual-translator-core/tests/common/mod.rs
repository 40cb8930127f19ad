//! Shared fixtures: PDFs generated on the fly with lopdf.

#![allow(dead_code, clippy::expect_used, clippy::cast_precision_loss)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// A4 in points.
pub const A4: (i64, i64) = (595, 842);

/// Build a PDF with one page per entry, each page showing its lines in
/// Helvetica 12pt, 20pt apart, on an A4 page.
pub fn make_pdf(pages: &[Vec<String>]) -> Vec<u8> {
    let sized: Vec<(Vec<String>, (i64, i64))> = pages.iter().map(|lines| (lines.clone(), A4)).collect();
    make_pdf_with_sizes(&sized)
}

/// Like [`make_pdf`], with an explicit page size per page.
pub fn make_pdf_with_sizes(pages: &[(Vec<String>, (i64, i64))]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (lines, (width, height)) in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let y = height - 72 - 20 * i64::try_from(i).expect("line index");
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(line.as_str())]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations }.encode().expect("encode content");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), (*height).into()],
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).expect("page count");
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save PDF");
    bytes
}

/// `n` pages whose single line reads "Page {i} body".
pub fn numbered_pdf(n: usize) -> Vec<u8> {
    let pages: Vec<Vec<String>> = (1..=n).map(|i| vec![format!("Page {i} body")]).collect();
    make_pdf(&pages)
}

/// MediaBox of every page of a PDF, in page order.
pub fn media_boxes(bytes: &[u8]) -> Vec<(f32, f32)> {
    let doc = Document::load_mem(bytes).expect("load output PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).expect("page dictionary");
            let media_box = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("MediaBox");
            let number = |o: &Object| o.as_float().or_else(|_| o.as_i64().map(|v| v as f32)).expect("number");
            (number(&media_box[2]), number(&media_box[3]))
        })
        .collect()
}

pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).expect("load output PDF").get_pages().len()
}

/// Decoded content stream operations of every page, in page order.
pub fn page_operations(bytes: &[u8]) -> Vec<Vec<Operation>> {
    let doc = Document::load_mem(bytes).expect("load output PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).expect("page content");
            Content::decode(&content).expect("decode content").operations
        })
        .collect()
}

/// Operators of one page, e.g. `["q", "cm", "Do", ...]`.
pub fn operators(operations: &[Operation]) -> Vec<&str> {
    operations.iter().map(|op| op.operator.as_str()).collect()
}

/// Raw string operands of every `Tj` on one page.
pub fn shown_text(operations: &[Operation]) -> Vec<Vec<u8>> {
    operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .map(|op| op.operands[0].as_str().expect("Tj string").to_vec())
        .collect()
}

/// Follow `/Resources/<category>/<name>` of the first page to its object.
pub fn first_page_resource(bytes: &[u8], category: &[u8], name: &[u8]) -> Object {
    let doc = Document::load_mem(bytes).expect("load output PDF");
    let page_id = *doc.get_pages().values().next().expect("a page");
    let reference = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Resources"))
        .and_then(Object::as_dict)
        .and_then(|resources| resources.get(category))
        .and_then(Object::as_dict)
        .and_then(|entries| entries.get(name))
        .and_then(Object::as_reference)
        .expect("resource reference");
    doc.get_object(reference).expect("resource object").clone()
}
