pub mod sweep;
pub mod template;

use std::path::Path;

use image::GrayImage;

/// Load a logo template image and convert it to grayscale.
///
/// A missing or undecodable template is a fatal precondition: no partial sweep
/// is attempted.
pub fn load_template(path: impl AsRef<Path>) -> crate::error::Result<GrayImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|e| {
        crate::error::DelogoError::template(format!(
            "cannot load template image {}: {e}",
            path.display()
        ))
    })?;
    Ok(img.to_luma8())
}
