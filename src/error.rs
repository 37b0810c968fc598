use thiserror::Error;

#[derive(Debug, Error)]
pub enum DelogoError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Content stream error: {0}")]
    ContentStreamError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Extraction error: {0}")]
    ExtractError(String),

    #[error("Removal error: {0}")]
    RemovalError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`DelogoError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl DelogoError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a content stream error.
    content_stream => ContentStreamError,
    /// Create a render error.
    render => RenderError,
    /// Create a template error.
    template => TemplateError,
    /// Create an extraction error.
    extract => ExtractError,
    /// Create a removal error.
    removal => RemovalError,
}

impl From<lopdf::Error> for DelogoError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_yml::Error> for DelogoError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

#[cfg(feature = "render")]
impl From<pdfium_render::prelude::PdfiumError> for DelogoError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for DelogoError {
    fn from(e: image::ImageError) -> Self {
        Self::TemplateError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DelogoError>;
