use std::path::Path;

use crate::{docx, pdf, ExtractError};

/// Formats the extractor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Format implied by the text after the last `.` of a file name.
    pub fn from_filename(filename: &str) -> Option<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, extension)| Self::from_extension(extension))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::from_filename)
    }
}

/// Outcome of reading a document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Text was extracted (possibly empty, e.g. an image-only PDF).
    Text(String),
    /// The extension is not one we read.
    Unsupported,
    /// The document could not be parsed; the reason is kept for diagnostics.
    Failed { reason: String },
}

impl Extraction {
    /// The extracted text, or `""` when nothing could be read.
    pub fn text(&self) -> &str {
        match self {
            Extraction::Text(text) => text,
            Extraction::Unsupported | Extraction::Failed { .. } => "",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Extraction::Text(text) => text,
            Extraction::Unsupported | Extraction::Failed { .. } => String::new(),
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Extraction::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

pub struct FileReader;

impl FileReader {
    pub fn read_file(path: &Path) -> Result<Extraction, ExtractError> {
        match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Pdf) => Ok(pdf::extract_pdf_text(path)),
            Some(DocumentFormat::Docx) => docx::extract_docx_text(path).map(Extraction::Text),
            None => {
                tracing::debug!(path = %path.display(), "no extractor for file type");
                Ok(Extraction::Unsupported)
            }
        }
    }
}
