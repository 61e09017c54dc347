//! Filesystem-backed asset storage for images, banners, and avatars.
//!
//! Uploaded files live under `<root>/<note_id>/<kind>/` and are named by a
//! prefix of their blake3 content hash, so re-uploading identical bytes
//! yields the same reference. Callers embed the returned `asset://` URL in
//! block data (`data.file.url`) or an entity's `banner` field, and only do
//! so after the upload has succeeded.

use crate::{NotewellError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

const ASSET_SCHEME: &str = "asset://";

/// Number of hash characters used in stored filenames.
const HASH_PREFIX_LEN: usize = 16;

/// The kind of asset being stored; each kind gets its own subfolder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Images embedded in block content.
    Image,
    /// Page banner images.
    Banner,
    /// Profile pictures.
    Avatar,
}

impl AssetKind {
    fn dir(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Banner => "banners",
            Self::Avatar => "avatars",
        }
    }
}

/// An object store rooted at a directory, constructed by the caller.
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Opens (and creates if needed) an asset store rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    /// Stores `bytes` for `note_id` and returns a durable `asset://` URL.
    ///
    /// The file extension is taken from `filename`; the stored name is a
    /// content-hash prefix, so identical bytes map to the same URL.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::UploadFailure`] if the file cannot
    /// be written.
    pub fn put(
        &self,
        note_id: &str,
        kind: AssetKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let hash = blake3::hash(bytes).to_hex();
        let stem = &hash.as_str()[..HASH_PREFIX_LEN];
        let name = match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };

        let dir = self.root.join(note_id).join(kind.dir());
        fs::create_dir_all(&dir)
            .map_err(|e| NotewellError::UploadFailure(e.to_string()))?;
        fs::write(dir.join(&name), bytes)
            .map_err(|e| NotewellError::UploadFailure(e.to_string()))?;

        Ok(format!("{ASSET_SCHEME}{note_id}/{}/{name}", kind.dir()))
    }

    /// Stores a replacement asset, deleting the previous one first.
    ///
    /// Deletion of the old asset is best-effort cleanup only: a failure is
    /// logged and never blocks the new upload.
    pub fn replace(
        &self,
        old_url: Option<&str>,
        note_id: &str,
        kind: AssetKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String> {
        if let Some(old) = old_url {
            if let Err(e) = self.delete(old) {
                log::warn!("failed to delete previous asset {old}: {e}");
            }
        }
        self.put(note_id, kind, filename, bytes)
    }

    /// Deletes the asset at `url`.
    pub fn delete(&self, url: &str) -> Result<()> {
        let path = self.resolve(url)?;
        fs::remove_file(path)?;
        Ok(())
    }

    /// Reads the asset bytes at `url`.
    pub fn read(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url)?;
        Ok(fs::read(path)?)
    }

    /// Maps an `asset://` URL back to its path under the store root.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotewellError::InvalidAssetRef`] for URLs with a
    /// different scheme or with path components that would escape the root.
    pub fn resolve(&self, url: &str) -> Result<PathBuf> {
        let rel = url
            .strip_prefix(ASSET_SCHEME)
            .ok_or_else(|| NotewellError::InvalidAssetRef(url.to_string()))?;
        let rel_path = Path::new(rel);
        let safe = rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if rel.is_empty() || !safe {
            return Err(NotewellError::InvalidAssetRef(url.to_string()));
        }
        Ok(self.root.join(rel_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path()).unwrap();

        let url = store
            .put("note-1", AssetKind::Image, "photo.png", b"png bytes")
            .unwrap();
        assert!(url.starts_with("asset://note-1/images/"));
        assert!(url.ends_with(".png"));
        assert_eq!(store.read(&url).unwrap(), b"png bytes");
    }

    #[test]
    fn test_identical_bytes_map_to_same_url() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path()).unwrap();

        let a = store
            .put("n", AssetKind::Banner, "one.jpg", b"same")
            .unwrap();
        let b = store
            .put("n", AssetKind::Banner, "two.jpg", b"same")
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kinds_use_separate_folders() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path()).unwrap();

        let image = store.put("n", AssetKind::Image, "a.png", b"x").unwrap();
        let banner = store.put("n", AssetKind::Banner, "a.png", b"x").unwrap();
        let avatar = store.put("n", AssetKind::Avatar, "a.png", b"x").unwrap();
        assert!(image.contains("/images/"));
        assert!(banner.contains("/banners/"));
        assert!(avatar.contains("/avatars/"));
    }

    #[test]
    fn test_replace_deletes_old_and_survives_missing_old() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path()).unwrap();

        let old = store.put("n", AssetKind::Banner, "a.png", b"old").unwrap();
        let new = store
            .replace(Some(&old), "n", AssetKind::Banner, "b.png", b"new")
            .unwrap();
        assert!(store.read(&old).is_err());
        assert_eq!(store.read(&new).unwrap(), b"new");

        // A dangling old reference must not block the upload.
        let newer = store
            .replace(
                Some("asset://n/banners/gone.png"),
                "n",
                AssetKind::Banner,
                "c.png",
                b"newer",
            )
            .unwrap();
        assert_eq!(store.read(&newer).unwrap(), b"newer");
    }

    #[test]
    fn test_resolve_rejects_foreign_schemes_and_traversal() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.resolve("https://example.com/x.png"),
            Err(NotewellError::InvalidAssetRef(_))
        ));
        assert!(matches!(
            store.resolve("asset://../../etc/passwd"),
            Err(NotewellError::InvalidAssetRef(_))
        ));
        assert!(matches!(
            store.resolve("asset://"),
            Err(NotewellError::InvalidAssetRef(_))
        ));
    }
}
