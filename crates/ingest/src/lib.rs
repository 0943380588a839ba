pub mod docx;
pub mod pdf;
pub mod reader;

pub use reader::{DocumentFormat, Extraction, FileReader};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort extraction instead of degrading to empty text.
///
/// Only the DOCX path produces these; PDF problems are reported through
/// [`Extraction::Failed`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("malformed DOCX document.xml: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Extract the plain text of the document at `path`, dispatching on its extension.
pub fn extract_text(path: &Path) -> Result<Extraction, ExtractError> {
    FileReader::read_file(path)
}
