use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::Extraction;

/// Read every page of a PDF in page order.
///
/// Never fails: a file lopdf cannot load (or that makes it panic) comes back
/// as [`Extraction::Failed`] with a warning logged.
pub fn extract_pdf_text(path: &Path) -> Extraction {
    let _span = tracing::info_span!("ingest.pdf", path = %path.display()).entered();

    match panic::catch_unwind(AssertUnwindSafe(|| read_pages(path))) {
        Ok(Ok(text)) => Extraction::Text(text),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "PDF read error");
            Extraction::Failed {
                reason: format!("PDF read error: {e}"),
            }
        }
        Err(_) => {
            tracing::warn!("PDF parser panicked");
            Extraction::Failed {
                reason: "PDF parser panicked".to_string(),
            }
        }
    }
}

fn read_pages(path: &Path) -> Result<String, lopdf::Error> {
    let doc = lopdf::Document::load(path)?;
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => tracing::debug!(page = page_num, error = %e, "page has no extractable text"),
        }
    }

    Ok(text)
}
