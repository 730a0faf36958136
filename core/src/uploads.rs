//! Photo storage for beds and tasks.
//!
//! Uploaded files are written into a single directory under a random
//! name that keeps the original (lower-cased) extension. Records store
//! only that generated name; an empty name means "no photo".

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

/// A user-submitted file: the name the client sent and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Read a local file as if it had been uploaded under its own name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read photo: {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, data })
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create upload directory: {}", self.dir.display())
        })
    }

    /// Store an upload and return its generated file name.
    ///
    /// Returns an empty string, without touching the filesystem, when no
    /// file was supplied.
    pub fn save(&self, upload: Option<&Upload>) -> Result<String> {
        let Some(upload) = upload.filter(|u| !u.filename.is_empty()) else {
            return Ok(String::new());
        };

        self.ensure_dir()?;
        let name = generated_name(&upload.filename);
        let path = self.dir.join(&name);
        fs::write(&path, &upload.data)
            .with_context(|| format!("Failed to write upload: {}", path.display()))?;

        tracing::debug!(
            original = %upload.filename,
            stored = %name,
            bytes = upload.data.len(),
            "saved upload"
        );
        Ok(name)
    }

    /// Full path of a stored file, or `None` when there is nothing to show.
    #[must_use]
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        is_plain_file_name(filename).then(|| self.dir.join(filename))
    }

    /// Read a stored photo. Missing or unreadable files yield `None` so the
    /// caller can fall back to a placeholder.
    #[must_use]
    pub fn read(&self, filename: &str) -> Option<Vec<u8>> {
        let path = self.resolve(filename)?;
        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "photo could not be read");
                None
            }
        }
    }
}

fn generated_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let ext = Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    format!("{}{ext}", Uuid::new_v4().simple())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, UploadStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path().join("uploads"));
        (tmp, store)
    }

    #[test]
    fn test_save_generates_distinct_names_with_extension() {
        let (_tmp, store) = store();
        let upload = Upload::new("photo.jpg", b"first".to_vec());

        let a = store.save(Some(&upload)).unwrap();
        let b = store.save(Some(&upload)).unwrap();

        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        assert!(b.ends_with(".jpg"));
        // 32 hex chars + ".jpg"
        assert_eq!(a.len(), 36);
        assert_eq!(fs::read(store.dir().join(&a)).unwrap(), b"first");
    }

    #[test]
    fn test_save_lowercases_extension_and_strips_directories() {
        let (_tmp, store) = store();
        let upload = Upload::new("C:\\fakepath\\Garden.PNG", b"png".to_vec());
        let name = store.save(Some(&upload)).unwrap();
        assert!(name.ends_with(".png"));
        assert!(!name.contains('\\'));

        let upload = Upload::new("../../etc/Bed.JPEG", b"jpeg".to_vec());
        let name = store.save(Some(&upload)).unwrap();
        assert!(name.ends_with(".jpeg"));
        assert!(store.dir().join(&name).exists());
    }

    #[test]
    fn test_save_without_extension() {
        let (_tmp, store) = store();
        let name = store
            .save(Some(&Upload::new("snapshot", b"raw".to_vec())))
            .unwrap();
        assert_eq!(name.len(), 32);
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_save_without_file_returns_empty() {
        let (_tmp, store) = store();
        assert_eq!(store.save(None).unwrap(), "");
        assert_eq!(
            store.save(Some(&Upload::new("", b"data".to_vec()))).unwrap(),
            ""
        );
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let (_tmp, store) = store();
        store.ensure_dir().unwrap();
        store.ensure_dir().unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_read_falls_back_to_none() {
        let (_tmp, store) = store();
        let name = store
            .save(Some(&Upload::new("a.png", b"img".to_vec())))
            .unwrap();
        assert_eq!(store.read(&name).unwrap(), b"img");

        assert!(store.read("").is_none());
        assert!(store.read("missing.png").is_none());
        assert!(store.read("../secret").is_none());
        assert!(store.resolve("..").is_none());
    }

    #[test]
    fn test_upload_from_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Dobe.JPG");
        fs::write(&path, b"bytes").unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.filename, "Dobe.JPG");
        assert_eq!(upload.data, b"bytes");

        assert!(Upload::from_path(&tmp.path().join("nope.jpg")).is_err());
    }
}
