//! Plain text from uploaded attachments.
//!
//! PDFs go through the `pdftotext` binary, DOCX files are read straight from
//! their zip container. Anything else has no text.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tokio::process::Command;

const PDFTOTEXT: &str = "pdftotext";
const DOCX_BODY: &str = "word/document.xml";

// A text run or the end of a paragraph
static DOCX_TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|</w:p>").expect("DOCX_TEXT_REGEX must be valid")
});

static XML_ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(lt|gt|quot|apos|amp|#[xX][0-9A-Fa-f]+|#[0-9]+);")
        .expect("XML_ENTITY_REGEX must be valid")
});

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("invalid docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts the text of a stored file. Failures are logged and read as no
/// text, an unreadable attachment never fails the upload.
pub async fn extract_text(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let result = match extension.as_deref() {
        Some("pdf") => extract_pdf(path).await,
        Some("docx") => extract_docx(path.to_path_buf()).await,
        _ => return String::new(),
    };

    match result {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("could not extract text from {}: {e}", path.display());
            String::new()
        }
    }
}

async fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    let output = Command::new(PDFTOTEXT)
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => Err(ExtractionError::ExtractionFailed(format!(
            "{PDFTOTEXT}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(PDFTOTEXT.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

async fn extract_docx(path: PathBuf) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || read_docx(&path))
        .await
        .map_err(|e| ExtractionError::ExtractionFailed(e.to_string()))?
}

fn read_docx(path: &Path) -> Result<String, ExtractionError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY)?.read_to_string(&mut xml)?;
    Ok(docx_xml_to_text(&xml))
}

/// Text runs of a WordprocessingML body, one line per paragraph
pub fn docx_xml_to_text(xml: &str) -> String {
    let mut text = String::new();
    for captures in DOCX_TEXT_REGEX.captures_iter(xml) {
        match captures.get(1) {
            Some(run) => text.push_str(&unescape_xml(run.as_str())),
            None => text.push('\n'),
        }
    }
    text.trim_end().to_string()
}

/// Named and numeric character references. Unknown or invalid references stay as written.
fn unescape_xml(value: &str) -> String {
    XML_ENTITY_REGEX
        .replace_all(value, |captures: &Captures| {
            let entity = &captures[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| entity[1..].parse())
                    .ok()
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| captures[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document><w:body>
<w:p><w:r><w:t>Biên bản</w:t></w:r><w:r><w:t xml:space="preserve"> ghi nhớ</w:t></w:r></w:p>
<w:p><w:r><w:tab/><w:t>A &amp; B &lt;2024&gt;</w:t></w:r></w:p>
</w:body></w:document>"#;

    #[test]
    fn numeric_references_are_decoded() {
        assert_eq!(unescape_xml("H&#x1EA1;n &#8211; 2024"), "Hạn – 2024");
        assert_eq!(unescape_xml("&amp;#x41; &#xD800; &nbsp;"), "&#x41; &#xD800; &nbsp;");
    }

    #[test]
    fn runs_are_joined_per_paragraph() {
        assert_eq!(docx_xml_to_text(BODY), "Biên bản ghi nhớ\nA & B <2024>");
    }

    #[tokio::test]
    async fn docx_text_is_read_from_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.DOCX");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        writer
            .start_file(DOCX_BODY, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(BODY.as_bytes()).unwrap();
        writer.finish().unwrap();

        assert_eq!(extract_text(&path).await, "Biên bản ghi nhớ\nA & B <2024>");
    }

    #[tokio::test]
    async fn broken_files_have_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert_eq!(extract_text(&path).await, "");

        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain").unwrap();
        assert_eq!(extract_text(&path).await, "");
    }
}
