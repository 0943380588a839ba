use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;

use crate::ExtractError;

const DOCUMENT_XML: &str = "word/document.xml";

/// Read the paragraphs of a DOCX file, joined by newlines in document order.
///
/// Unlike the PDF path, failures are returned to the caller.
pub fn extract_docx_text(path: &Path) -> Result<String, ExtractError> {
    let _span = tracing::info_span!("ingest.docx", path = %path.display()).entered();

    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;
    let xml = read_document_xml(&mut archive, path)?;

    let paragraphs = parse_paragraphs(&xml)?;
    tracing::debug!(paragraphs = paragraphs.len(), "read DOCX paragraphs");
    Ok(paragraphs.join("\n"))
}

fn read_document_xml<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &Path,
) -> Result<String, ExtractError> {
    let mut entry = archive.by_name(DOCUMENT_XML)?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|source| ExtractError::Io {
            path: path.join(DOCUMENT_XML),
            source,
        })?;
    Ok(xml)
}

fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match (e.local_name().as_ref(), current.as_mut()) {
                (b"p", _) => paragraphs.push(String::new()),
                (b"tab", Some(paragraph)) => paragraph.push('\t'),
                (b"br" | b"cr", Some(paragraph)) => paragraph.push('\n'),
                _ => {}
            },
            Event::Text(e) => {
                if let (true, Some(paragraph)) = (in_text, current.as_mut()) {
                    paragraph.push_str(&e.decode().unwrap_or_default());
                }
            }
            Event::GeneralRef(r) => {
                if let (true, Some(paragraph)) = (in_text, current.as_mut()) {
                    push_reference(paragraph, &r)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Appends the character an `&...;` reference stands for; unknown entities are kept verbatim.
fn push_reference(paragraph: &mut String, reference: &BytesRef<'_>) -> Result<(), ExtractError> {
    if let Some(ch) = reference.resolve_char_ref()? {
        paragraph.push(ch);
        return Ok(());
    }

    let name = reference.decode().unwrap_or_default();
    match resolve_predefined_entity(&name) {
        Some(resolved) => paragraph.push_str(resolved),
        None => {
            paragraph.push('&');
            paragraph.push_str(&name);
            paragraph.push(';');
        }
    }
    Ok(())
}
