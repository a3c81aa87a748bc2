use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::domain::repository::{AttachmentStore, StoredAttachment};
use crate::infrastructure::extract::extract_text;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const FALLBACK_STEM: &str = "file";

/// Upload directory on the local disk. Stored paths are plain file names
/// relative to it.
#[derive(Clone, Debug)]
pub struct UploadStorage {
    directory: PathBuf,
}

impl UploadStorage {
    pub async fn new(directory: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory)
            .await
            .with_context(|| format!("failed to create upload directory {}", directory.display()))?;
        Ok(Self { directory })
    }

    fn path_of(&self, name: &str) -> Option<PathBuf> {
        is_plain_file_name(name).then(|| self.directory.join(name))
    }
}

impl AttachmentStore for UploadStorage {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<StoredAttachment> {
        let name = unique_name(file_name, Utc::now().naive_utc());
        let (stem, extension) = split_extension(&name);

        for attempt in 0u32.. {
            let candidate = match attempt {
                0 => name.clone(),
                n => format!("{stem}_{n}{extension}"),
            };
            let path = self.directory.join(&candidate);

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match file {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to create {}", path.display()));
                }
            };

            write_or_discard(&mut file, &path, bytes).await?;

            let text = extract_text(&path).await;
            tracing::info!(file = %candidate, bytes = bytes.len(), "attachment stored");
            return Ok(StoredAttachment {
                path: candidate,
                text,
            });
        }
        anyhow::bail!("no free file name for {file_name}")
    }

    async fn remove(&self, path: &str) {
        let Some(full_path) = self.path_of(path) else {
            tracing::warn!("refusing to delete {path}: not a stored file name");
            return;
        };
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => tracing::info!(file = path, "attachment removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(file = path, "attachment already gone")
            }
            Err(e) => tracing::warn!("could not delete file {}: {e}", full_path.display()),
        }
    }

    async fn locate(&self, name: &str) -> Option<PathBuf> {
        let path = self.path_of(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(path),
            _ => None,
        }
    }
}

/// Exactly one normal path component
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Writes a freshly created file, a failed write leaves no partial file behind
async fn write_or_discard<W>(writer: &mut W, path: &Path, bytes: &[u8]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        if let Err(remove) = tokio::fs::remove_file(path).await {
            tracing::warn!("could not remove partial upload {}: {remove}", path.display());
        }
        return Err(e).with_context(|| format!("failed to write {}", path.display()));
    }
    Ok(())
}

/// ASCII-only file name without path separators or leading dots
pub fn secure_filename(file_name: &str) -> String {
    use itertools::Itertools;

    let joined = file_name
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(['.', '_'])
        .to_string()
}

/// `stem_YYYYmmddHHMMSS.ext` from the sanitized upload name
pub fn unique_name(file_name: &str, now: NaiveDateTime) -> String {
    let secure = secure_filename(file_name);
    let (stem, extension) = split_extension(&secure);
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    format!("{stem}_{}{extension}", now.format(TIMESTAMP_FORMAT))
}

/// Splits at the last dot, the extension keeps its dot
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};

    use chrono::NaiveDate;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 17)
            .unwrap()
            .and_hms_opt(8, 30, 5)
            .unwrap()
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("công văn số 12.pdf"), "cng_vn_s_12.pdf");
        assert_eq!(secure_filename(".hidden"), "hidden");
    }

    #[test]
    fn unique_names_carry_a_timestamp() {
        assert_eq!(unique_name("report.final.docx", now()), "report.final_20240117083005.docx");
        assert_eq!(unique_name("README", now()), "README_20240117083005");
        assert_eq!(unique_name("văn.pdf", now()), "vn_20240117083005.pdf");
        assert_eq!(unique_name("ừ.pdf", now()), "pdf_20240117083005");
        assert_eq!(unique_name("ừ", now()), "file_20240117083005");
    }

    #[test]
    fn only_plain_names_are_accepted() {
        assert!(is_plain_file_name("memo_20240101.pdf"));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name("a/b.pdf"));
        assert!(!is_plain_file_name("a\\b.pdf"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("/etc/passwd"));
    }

    #[tokio::test]
    async fn same_name_twice_gets_a_counter() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path()).await.unwrap();

        let first = storage.save("memo.txt", b"one").await.unwrap();
        let second = storage.save("memo.txt", b"two").await.unwrap();

        assert!(first.path.starts_with("memo_"));
        assert_ne!(first.path, second.path);
        assert_eq!(first.text, "");
        let located = storage.locate(&second.path).await.unwrap();
        assert_eq!(std::fs::read(located).unwrap(), b"two");
    }

    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_write_removes_the_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo_20240117083005.pdf");
        std::fs::write(&path, b"%PD").unwrap();

        let result = write_or_discard(&mut FullDisk, &path, b"%PDF-1.7").await;

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn removed_files_cannot_be_located() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().join("uploads")).await.unwrap();
        let stored = storage.save("a.pdf", b"%PDF").await.unwrap();

        storage.remove(&stored.path).await;
        assert!(storage.locate(&stored.path).await.is_none());
        storage.remove(&stored.path).await;
        assert!(storage.locate("../a.pdf").await.is_none());
    }
}
