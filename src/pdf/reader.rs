use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::error::{DelogoError, Result};

/// Read-only view of a PDF document.
///
/// The read stages (extraction, sweep) own a `PdfReader`; it is dropped before
/// a [`crate::pdf::editor::PdfEditor`] re-opens the file for mutation, so the
/// document is never held by two stages at once.
pub struct PdfReader {
    doc: Document,
}

/// One image XObject reachable from a page's resources, in discovery order.
pub struct ImageXObject {
    /// Resource name under the page's XObject dictionary (e.g. "Im1").
    pub name: String,
    /// Indirect object id, when the resource entry is a reference.
    pub object_id: Option<lopdf::ObjectId>,
    pub stream: lopdf::Stream,
}

impl PdfReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            doc: Document::load(path)?,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Page dimensions (width_pts, height_pts) of a 1-indexed page.
    pub fn page_dimensions(&self, page_num: u32) -> Result<(f64, f64)> {
        let page_dict = self.doc.get_dictionary(self.get_page_id(page_num)?)?;
        let [x0, y0, x1, y1] = self.media_box(page_dict)?;

        let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());
        if width <= 0.0 || height <= 0.0 {
            return Err(DelogoError::pdf_read("MediaBox has non-positive extent"));
        }
        // 14,400 pt (200 in) is the format's nominal page-size ceiling.
        if width > 14_400.0 || height > 14_400.0 {
            return Err(DelogoError::pdf_read("MediaBox exceeds the PDF page-size limit"));
        }
        Ok((width, height))
    }

    /// MediaBox coordinates of a page dictionary, following Parent
    /// inheritance up the page tree.
    fn media_box(&self, dict: &Dictionary) -> Result<[f64; 4]> {
        if let Ok(obj) = dict.get(b"MediaBox") {
            let arr = obj.as_array()?;
            if arr.len() < 4 {
                return Err(DelogoError::pdf_read("MediaBox has fewer than 4 entries"));
            }
            let mut coords = [0.0f64; 4];
            for (slot, entry) in coords.iter_mut().zip(arr) {
                *slot = match entry {
                    Object::Integer(i) => *i as f64,
                    Object::Real(r) => *r as f64,
                    _ => return Err(DelogoError::pdf_read("non-numeric MediaBox entry")),
                };
            }
            return Ok(coords);
        }

        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
            return self.media_box(self.doc.get_dictionary(*parent_id)?);
        }

        Err(DelogoError::pdf_read("MediaBox not found"))
    }

    /// Content stream bytes of a 1-indexed page (multiple streams joined).
    pub fn page_content_stream(&self, page_num: u32) -> Result<Vec<u8>> {
        Ok(self.doc.get_page_content(self.get_page_id(page_num)?)?)
    }

    /// All Subtype=Image XObjects reachable from a 1-indexed page's resources,
    /// in resource-dictionary discovery order.
    pub fn page_image_xobjects(&self, page_num: u32) -> Result<Vec<ImageXObject>> {
        let page_id = self.get_page_id(page_num)?;
        let (resource_dict, resource_ids) = self.doc.get_page_resources(page_id)?;

        let mut images = Vec::new();

        // Resources embedded directly in the page dictionary.
        if let Some(dict) = resource_dict {
            self.collect_image_xobjects_from_dict(dict, &mut images)?;
        }

        // Referenced resources, including ones inherited from the page tree.
        for res_id in resource_ids {
            let dict = self.doc.get_dictionary(res_id)?;
            self.collect_image_xobjects_from_dict(dict, &mut images)?;
        }

        Ok(images)
    }

    /// Enumerate Subtype=Image streams under a resource dictionary's XObject
    /// entry, appending them to `images`.
    fn collect_image_xobjects_from_dict(
        &self,
        dict: &Dictionary,
        images: &mut Vec<ImageXObject>,
    ) -> Result<()> {
        let xobject_dict = match dict.get(b"XObject") {
            Ok(Object::Dictionary(d)) => d,
            Ok(Object::Reference(id)) => self.doc.get_object(*id).and_then(Object::as_dict)?,
            _ => return Ok(()),
        };

        for (name_bytes, value) in xobject_dict.iter() {
            let (object_id, stream) = match value {
                Object::Reference(id) => {
                    (Some(*id), self.doc.get_object(*id).and_then(Object::as_stream)?)
                }
                Object::Stream(s) => (None, s),
                _ => continue,
            };

            if let Ok(subtype) = stream.dict.get(b"Subtype").and_then(Object::as_name)
                && subtype == b"Image"
            {
                images.push(ImageXObject {
                    name: String::from_utf8_lossy(name_bytes).into_owned(),
                    object_id,
                    stream: stream.clone(),
                });
            }
        }

        Ok(())
    }

    /// ObjectId of a 1-indexed page number.
    fn get_page_id(&self, page_num: u32) -> Result<lopdf::ObjectId> {
        self.doc
            .get_pages()
            .get(&page_num)
            .copied()
            .ok_or_else(|| DelogoError::pdf_read(format!("page {page_num} not found")))
    }
}
