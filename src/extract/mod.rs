pub mod dedup;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::pdf::content_stream::{BBox, extract_xobject_placements};
use crate::pdf::reader::{ImageXObject, PdfReader};

/// Document-store handle for one embedded image XObject occurrence.
#[derive(Debug, Clone)]
pub struct RasterRef {
    /// 0-based page index.
    pub page_index: u32,
    /// Resource name under the page's XObject dictionary.
    pub name: String,
    /// Indirect object id, when the resource entry is a reference.
    pub object_id: Option<lopdf::ObjectId>,
}

/// One embedded raster object pulled out of a page.
///
/// `content_hash` is a SHA-256 digest over the raw encoded stream bytes, so
/// bit-identical embedded objects collapse without ever being decoded.
#[derive(Debug, Clone)]
pub struct RasterComponent {
    pub raster: RasterRef,
    /// Decoded bounds; 0 x 0 when the bounds could not be determined.
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
    /// Raw encoded stream bytes, exactly as stored in the document.
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`; the deduplication key.
    pub content_hash: String,
    /// Stream encoding, derived from the PDF Filter entry (e.g. "jpeg").
    pub encoding: String,
    /// Placement on the page in PDF points, when the content stream yields one.
    pub bbox: Option<BBox>,
}

/// Walk every page of the document and pull out its embedded raster objects.
///
/// Page order and within-page discovery order are preserved. A page that fails
/// to enumerate contributes zero components; the walk continues with the rest
/// of the document. Read-only.
pub fn extract_raster_components(reader: &PdfReader) -> Vec<RasterComponent> {
    let mut components = Vec::new();
    let page_count = reader.page_count();

    for page_num in 1..=page_count {
        let images = match reader.page_image_xobjects(page_num) {
            Ok(images) => images,
            Err(e) => {
                warn!(page = page_num, error = %e, "image enumeration failed, skipping page");
                continue;
            }
        };

        if images.is_empty() {
            continue;
        }

        // Placements are best-effort: a content stream that fails to parse
        // yields components without bboxes, not a skipped page.
        let placements = reader
            .page_content_stream(page_num)
            .and_then(|bytes| extract_xobject_placements(&bytes))
            .unwrap_or_else(|e| {
                warn!(page = page_num, error = %e, "placement extraction failed");
                Vec::new()
            });

        debug!(page = page_num, images = images.len(), "extracting raster objects");

        for image in images {
            components.push(component_from_xobject(page_num - 1, image, &placements));
        }
    }

    components
}

fn component_from_xobject(
    page_index: u32,
    image: ImageXObject,
    placements: &[crate::pdf::content_stream::XObjectPlacement],
) -> RasterComponent {
    let ImageXObject {
        name,
        object_id,
        stream,
    } = image;

    let bytes = stream.content.clone();
    let content_hash = hex::encode(Sha256::digest(&bytes));
    let encoding = stream_encoding(&stream.dict);
    let (width, height) = image_bounds(&stream.dict, &bytes);
    let bbox = placements
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.bbox.clone());

    RasterComponent {
        raster: RasterRef {
            page_index,
            name,
            object_id,
        },
        width,
        height,
        byte_size: bytes.len(),
        content_hash,
        encoding,
        bytes,
        bbox,
    }
}

/// Map the stream's Filter entry to a short encoding label.
fn stream_encoding(dict: &lopdf::Dictionary) -> String {
    let filter_name = match dict.get(b"Filter") {
        Ok(lopdf::Object::Name(name)) => Some(name.clone()),
        // Filter chain: the outermost filter names the stored encoding.
        Ok(lopdf::Object::Array(arr)) => arr.first().and_then(|obj| {
            if let lopdf::Object::Name(name) = obj {
                Some(name.clone())
            } else {
                None
            }
        }),
        _ => None,
    };

    let label = match filter_name.as_deref() {
        Some(name) if name == b"DCTDecode" => "jpeg",
        Some(name) if name == b"JPXDecode" => "jp2",
        Some(name) if name == b"FlateDecode" => "flate",
        Some(name) if name == b"CCITTFaxDecode" => "ccitt",
        Some(name) if name == b"JBIG2Decode" => "jbig2",
        _ => "raw",
    };
    label.to_string()
}

/// Determine reported bounds: dictionary Width/Height, falling back to a
/// decode of the encoded bytes. Failure is non-fatal and yields 0 x 0.
fn image_bounds(dict: &lopdf::Dictionary, bytes: &[u8]) -> (u32, u32) {
    let dims = (dict_get_u32(dict, b"Width"), dict_get_u32(dict, b"Height"));
    if let (Some(w), Some(h)) = dims {
        return (w, h);
    }

    match image::load_from_memory(bytes) {
        Ok(img) => (img.width(), img.height()),
        Err(_) => (0, 0),
    }
}

fn dict_get_u32(dict: &lopdf::Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key) {
        Ok(lopdf::Object::Integer(i)) if *i >= 0 && *i <= u32::MAX as i64 => Some(*i as u32),
        _ => None,
    }
}
