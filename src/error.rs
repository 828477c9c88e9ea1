use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExcerptError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Image encode error: {0}")]
    EncodeError(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error("Task error: {0}")]
    TaskError(String),

    /// 抽出画像がJPEG/PNGのどちらでもない。
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// 登録ページが出力対象ドキュメントに存在しない（1-based）。
    #[error("Page {0} does not exist in the target document")]
    MissingPage(u32),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`ExcerptError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl ExcerptError {
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
    /// Create a render error.
    render => RenderError,
    /// Create an image encode error.
    encode => EncodeError,
    /// Create a font error.
    font => FontError,
    /// Create a report error.
    report => ReportError,
    /// Create a task error.
    task => TaskError,
    /// Create an unsupported image format error.
    unsupported_image_format => UnsupportedImageFormat,
}

impl From<lopdf::Error> for ExcerptError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for ExcerptError {
    fn from(e: serde_json::Error) -> Self {
        Self::ReportError(e.to_string())
    }
}

impl From<serde_yml::Error> for ExcerptError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

#[cfg(feature = "pdfium")]
impl From<pdfium_render::prelude::PdfiumError> for ExcerptError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for ExcerptError {
    fn from(e: image::ImageError) -> Self {
        Self::EncodeError(e.to_string())
    }
}

impl From<ttf_parser::FaceParsingError> for ExcerptError {
    fn from(e: ttf_parser::FaceParsingError) -> Self {
        Self::FontError(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ExcerptError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExcerptError>;
