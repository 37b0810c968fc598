// Removal executor and editor tests: true deletion, region covering, the
// cover fallback, and persistence guarantees.

use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};
use pdf_delogo::extract::RasterRef;
use pdf_delogo::pdf::content_stream::BBox;
use pdf_delogo::pdf::editor::PdfEditor;
use pdf_delogo::pdf::reader::PdfReader;
use pdf_delogo::removal::{RemovalOutcome, RemovalTarget, execute_removal};

const LOGO_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02, 0x03];

/// One-page document with a single image XObject named `Im1`, drawn once.
fn build_single_image_pdf() -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let img_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 64,
            "Height" => 32,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        LOGO_BYTES.to_vec(),
    ));

    let content = b"q\n100 0 0 50 40 600 cm\n/Im1 Do\nQ\n".to_vec();
    let contents_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        "Contents" => contents_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => Object::Reference(img_id) },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save_fixture(doc: &mut Document) -> tempfile::NamedTempFile {
    let temp = tempfile::NamedTempFile::new().unwrap();
    doc.save(temp.path()).unwrap();
    temp
}

fn content_operators(path: &std::path::Path, page_num: u32) -> Vec<String> {
    let reader = PdfReader::open(path).unwrap();
    let bytes = reader.page_content_stream(page_num).unwrap();
    Content::decode(&bytes)
        .unwrap()
        .operations
        .into_iter()
        .map(|op| op.operator)
        .collect()
}

// ============================================================
// 1. PdfEditor primitives
// ============================================================

#[test]
fn test_delete_image_removes_resource_and_draw_ops() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("out.pdf");

    let mut editor = PdfEditor::open(source.path()).unwrap();
    editor.delete_image(1, "Im1").unwrap();
    editor.save(&out_path).unwrap();

    // The output page exposes no image XObjects and no Do invocations.
    let reader = PdfReader::open(&out_path).unwrap();
    assert!(reader.page_image_xobjects(1).unwrap().is_empty());
    drop(reader);
    assert!(!content_operators(&out_path, 1).iter().any(|op| op == "Do"));
}

#[test]
fn test_delete_image_unknown_name_fails() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);

    let mut editor = PdfEditor::open(source.path()).unwrap();
    assert!(editor.delete_image(1, "NoSuchImage").is_err());
}

#[test]
fn test_draw_cover_rect_appends_fill_above_content() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("out.pdf");

    let bbox = BBox {
        x_min: 40.0,
        y_min: 600.0,
        x_max: 140.0,
        y_max: 650.0,
    };
    let mut editor = PdfEditor::open(source.path()).unwrap();
    editor.draw_cover_rect(1, &bbox).unwrap();
    editor.save(&out_path).unwrap();

    let ops = content_operators(&out_path, 1);
    // Original drawing is untouched; the rectangle fill comes after it.
    let do_pos = ops.iter().position(|op| op == "Do").expect("Do kept");
    let re_pos = ops.iter().position(|op| op == "re").expect("re appended");
    assert!(re_pos > do_pos, "cover is z-ordered above existing content");
    assert!(ops.iter().any(|op| op == "f"), "rectangle is filled");
}

#[test]
fn test_save_refuses_source_path() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);

    let mut editor = PdfEditor::open(source.path()).unwrap();
    assert!(editor.save(source.path()).is_err());
}

#[test]
fn test_source_file_is_never_mutated() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let before = std::fs::read(source.path()).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("out.pdf");
    let mut editor = PdfEditor::open(source.path()).unwrap();
    editor.delete_image(1, "Im1").unwrap();
    editor.save(&out_path).unwrap();

    let after = std::fs::read(source.path()).unwrap();
    assert_eq!(before, after, "source bytes are untouched");
    assert!(out_path.exists());
}

// ============================================================
// 2. Removal executor
// ============================================================

#[test]
fn test_execute_removal_deletes_exact_object() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let mut editor = PdfEditor::open(source.path()).unwrap();

    let targets = vec![RemovalTarget::ExactObject {
        raster: RasterRef {
            page_index: 0,
            name: "Im1".to_string(),
            object_id: None,
        },
        bbox: None,
    }];
    let summary = execute_removal(&mut editor, &targets);

    assert_eq!(summary.requested, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.pages_touched, 1);
    assert_eq!(summary.outcomes, vec![(0, RemovalOutcome::Deleted)]);
    assert_eq!(summary.report(), "removed 1/1 targets");
}

#[test]
fn test_execute_removal_falls_back_to_cover() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let mut editor = PdfEditor::open(source.path()).unwrap();

    // Deletion of a missing name fails; the known region is covered instead.
    let targets = vec![RemovalTarget::ExactObject {
        raster: RasterRef {
            page_index: 0,
            name: "Missing".to_string(),
            object_id: None,
        },
        bbox: Some(BBox {
            x_min: 40.0,
            y_min: 600.0,
            x_max: 140.0,
            y_max: 650.0,
        }),
    }];
    let summary = execute_removal(&mut editor, &targets);

    assert_eq!(summary.outcomes, vec![(0, RemovalOutcome::CoveredFallback)]);
    assert_eq!(summary.removed, 1);
}

#[test]
fn test_execute_removal_failed_target_does_not_abort_run() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("out.pdf");
    let mut editor = PdfEditor::open(source.path()).unwrap();

    // A failing target (no such object, no bbox to cover) followed by a
    // succeeding one on the same page.
    let targets = vec![
        RemovalTarget::ExactObject {
            raster: RasterRef {
                page_index: 0,
                name: "Missing".to_string(),
                object_id: None,
            },
            bbox: None,
        },
        RemovalTarget::ExactObject {
            raster: RasterRef {
                page_index: 0,
                name: "Im1".to_string(),
                object_id: None,
            },
            bbox: None,
        },
    ];
    let summary = execute_removal(&mut editor, &targets);
    editor.save(&out_path).unwrap();

    assert_eq!(summary.requested, 2);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.pages_touched, 1);
    assert_eq!(
        summary.outcomes,
        vec![(0, RemovalOutcome::Failed), (0, RemovalOutcome::Deleted)]
    );
    assert!(out_path.exists(), "output is still produced");
}

#[test]
fn test_execute_removal_region_cover() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("out.pdf");
    let mut editor = PdfEditor::open(source.path()).unwrap();

    let targets = vec![RemovalTarget::RegionCover {
        page_index: 0,
        bbox: BBox {
            x_min: 10.0,
            y_min: 20.0,
            x_max: 110.0,
            y_max: 70.0,
        },
    }];
    let summary = execute_removal(&mut editor, &targets);
    editor.save(&out_path).unwrap();

    assert_eq!(summary.outcomes, vec![(0, RemovalOutcome::Covered)]);

    // Covering keeps the image; the fill is painted above it.
    let reader = PdfReader::open(&out_path).unwrap();
    assert_eq!(reader.page_image_xobjects(1).unwrap().len(), 1);
}

#[test]
fn test_execute_removal_empty_target_list() {
    let mut doc = build_single_image_pdf();
    let source = save_fixture(&mut doc);
    let mut editor = PdfEditor::open(source.path()).unwrap();

    let summary = execute_removal(&mut editor, &[]);
    assert_eq!(summary.requested, 0);
    assert_eq!(summary.removed, 0);
    assert_eq!(summary.pages_touched, 0);
    assert!(summary.outcomes.is_empty());
}
