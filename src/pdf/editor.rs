use std::path::{Path, PathBuf};

use lopdf::{Document, Object};

use crate::pdf::content_stream::{BBox, strip_xobject_ops};

/// Mutable handle on a PDF document, opened fresh from the source path.
///
/// Owns the document exclusively for the removal stage. Output always goes to
/// a distinct destination path; [`PdfEditor::save`] refuses the source path.
pub struct PdfEditor {
    doc: Document,
    source: PathBuf,
}

impl PdfEditor {
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let source = path.as_ref().to_path_buf();
        let doc = Document::load(&source)?;
        Ok(Self { doc, source })
    }

    /// Delete an image XObject from a 1-indexed page: removes its resource
    /// entry and strips its `Do` invocations from the content stream.
    ///
    /// Fails if the page has no XObject named `name`; the caller decides
    /// whether to fall back to covering.
    pub fn delete_image(&mut self, page_num: u32, name: &str) -> crate::error::Result<()> {
        let page_id = self.get_page_id(page_num)?;

        let removed_entries = self.remove_xobject_resource(page_id, name)?;
        if removed_entries == 0 {
            return Err(crate::error::DelogoError::removal(format!(
                "page {} has no image XObject named '{}'",
                page_num, name
            )));
        }

        let content = self.doc.get_page_content(page_id)?;
        let (stripped, _) = strip_xobject_ops(&content, name)?;
        self.doc
            .change_page_content(page_id, stripped)
            .map_err(|e| crate::error::DelogoError::pdf_write(e.to_string()))?;

        Ok(())
    }

    /// Remove `name` from every XObject resource dictionary reachable from the
    /// page. Returns the number of removed entries.
    fn remove_xobject_resource(
        &mut self,
        page_id: lopdf::ObjectId,
        name: &str,
    ) -> crate::error::Result<usize> {
        // Collect the ids of referenced resource dictionaries first; mutation
        // happens in a second pass to keep the borrow checker satisfied.
        let (_, resource_ids) = self.doc.get_page_resources(page_id)?;
        let resource_ids: Vec<lopdf::ObjectId> = resource_ids;

        let mut removed = 0;

        // Resources dictionary inlined in the page dictionary.
        let mut deferred_xobject_id: Option<lopdf::ObjectId> = None;
        if let Ok(page_dict) = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            && let Ok(resources) = page_dict.get_mut(b"Resources")
            && let Object::Dictionary(res_dict) = resources
        {
            match res_dict.get_mut(b"XObject") {
                Ok(Object::Dictionary(xobjects)) => {
                    if xobjects.remove(name.as_bytes()).is_some() {
                        removed += 1;
                    }
                }
                Ok(Object::Reference(id)) => deferred_xobject_id = Some(*id),
                _ => {}
            }
        }
        if let Some(id) = deferred_xobject_id {
            removed += self.remove_from_xobject_dict_object(id, name);
        }

        // Referenced resource dictionaries (possibly inherited).
        for res_id in resource_ids {
            let mut deferred: Option<lopdf::ObjectId> = None;
            if let Ok(res_dict) = self
                .doc
                .get_object_mut(res_id)
                .and_then(Object::as_dict_mut)
            {
                match res_dict.get_mut(b"XObject") {
                    Ok(Object::Dictionary(xobjects)) => {
                        if xobjects.remove(name.as_bytes()).is_some() {
                            removed += 1;
                        }
                    }
                    Ok(Object::Reference(id)) => deferred = Some(*id),
                    _ => {}
                }
            }
            if let Some(id) = deferred {
                removed += self.remove_from_xobject_dict_object(id, name);
            }
        }

        Ok(removed)
    }

    /// Remove `name` from an XObject dictionary stored as its own object.
    fn remove_from_xobject_dict_object(&mut self, id: lopdf::ObjectId, name: &str) -> usize {
        if let Ok(xobjects) = self.doc.get_object_mut(id).and_then(Object::as_dict_mut)
            && xobjects.remove(name.as_bytes()).is_some()
        {
            1
        } else {
            0
        }
    }

    /// Paint an opaque white rectangle over `bbox` (PDF points, bottom-left
    /// origin) on a 1-indexed page, z-ordered above existing content.
    pub fn draw_cover_rect(&mut self, page_num: u32, bbox: &BBox) -> crate::error::Result<()> {
        let page_id = self.get_page_id(page_num)?;

        let ops = format!(
            "\nq\n1 1 1 rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
            bbox.x_min,
            bbox.y_min,
            bbox.width(),
            bbox.height()
        );

        let mut content = self.doc.get_page_content(page_id)?;
        content.extend_from_slice(ops.as_bytes());
        self.doc
            .change_page_content(page_id, content)
            .map_err(|e| crate::error::DelogoError::pdf_write(e.to_string()))?;

        Ok(())
    }

    /// Persist the document to `dest`. The source path is never overwritten.
    pub fn save(&mut self, dest: impl AsRef<Path>) -> crate::error::Result<Vec<lopdf::ObjectId>> {
        let dest = dest.as_ref();
        if dest == self.source {
            return Err(crate::error::DelogoError::pdf_write(format!(
                "refusing to overwrite source document {}",
                self.source.display()
            )));
        }

        // Deleted XObjects whose streams are no longer referenced anywhere
        // are dropped from the output file body.
        let pruned = self.doc.prune_objects();

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| crate::error::DelogoError::pdf_write(e.to_string()))?;
        std::fs::write(dest, buf)?;

        Ok(pruned)
    }

    fn get_page_id(&self, page_num: u32) -> crate::error::Result<lopdf::ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page_num)
            .copied()
            .ok_or_else(|| crate::error::DelogoError::pdf_read(format!("page {} not found", page_num)))
    }
}
