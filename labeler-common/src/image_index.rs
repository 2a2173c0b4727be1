//! Image index
//!
//! Recursive image discovery under the dataset root, memoized until an
//! explicit refresh or invalidation.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{Error, Result};

/// Extensions recognized as images when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Cached listing of image files under a dataset root
///
/// Paths are stored relative to the root with `/` separators, so they can be
/// written to the label log and embedded in URLs unchanged.
pub struct ImageIndex {
    root: PathBuf,
    extensions: HashSet<String>,
    cache: RwLock<Option<Arc<Vec<String>>>>,
}

impl ImageIndex {
    /// Create an index over `root` matching the given extensions
    ///
    /// Extensions are compared case-insensitively and may be given with or
    /// without a leading dot.
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self {
            root: root.into(),
            extensions,
            cache: RwLock::new(None),
        }
    }

    /// Create an index using [`DEFAULT_EXTENSIONS`]
    pub fn with_default_extensions(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DEFAULT_EXTENSIONS.iter().copied())
    }

    /// Dataset root this index scans
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the cached image list, scanning on first use
    pub fn list_images(&self) -> Arc<Vec<String>> {
        if let Some(images) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(images);
        }

        let scanned = Arc::new(self.scan());
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent caller may have filled the cache while we scanned
        Arc::clone(cache.get_or_insert(scanned))
    }

    /// Number of images in the (cached) listing
    pub fn len(&self) -> usize {
        self.list_images().len()
    }

    /// True if the (cached) listing is empty
    pub fn is_empty(&self) -> bool {
        self.list_images().is_empty()
    }

    /// Rescan the root and replace the cache, returning the new image count
    pub fn refresh(&self) -> usize {
        let scanned = Arc::new(self.scan());
        let count = scanned.len();
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(scanned);
        info!("Image index refreshed: {} images under {}", count, self.root.display());
        count
    }

    /// Drop the cached listing; the next `list_images` call rescans
    pub fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!("Image index cache invalidated");
    }

    /// Walk the root without consulting or updating the cache
    ///
    /// A missing root yields an empty list. Entries that cannot be read are
    /// skipped.
    pub fn scan(&self) -> Vec<String> {
        if !self.root.is_dir() {
            debug!("Dataset root {} does not exist, index is empty", self.root.display());
            return Vec::new();
        }

        // Symlinked directories are not descended into; symlinked files are
        // kept when their target is a regular file inside the root
        let canonical_root = self.root.canonicalize().ok();
        let mut images = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error accessing entry: {}", e);
                    continue;
                }
            };

            let is_file = if entry.file_type().is_symlink() {
                self.is_contained_file_link(&entry, canonical_root.as_deref())
            } else {
                entry.file_type().is_file()
            };
            if !is_file || !self.is_image(entry.path()) {
                continue;
            }

            match self.relative_path(entry.path()) {
                Some(relative) => images.push(relative),
                None => warn!("Skipping non-UTF-8 path: {}", entry.path().display()),
            }
        }

        debug!("Scanned {}: {} images", self.root.display(), images.len());
        images
    }

    /// Map a relative image path to its location on disk
    ///
    /// Rejects parent-directory, absolute, and prefix components outright,
    /// then canonicalizes to catch symlinks pointing outside the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        if relative.trim().is_empty() {
            return Err(Error::InvalidInput("Empty image path".to_string()));
        }

        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::AccessDenied(relative.to_string()));
        }

        let full = self.root.join(path);
        if !full.is_file() {
            return Err(Error::NotFound(format!("Image not found: {}", relative)));
        }

        let canonical_root = self.root.canonicalize()?;
        let canonical = full.canonicalize()?;
        if !canonical.starts_with(&canonical_root) {
            return Err(Error::AccessDenied(relative.to_string()));
        }

        Ok(canonical)
    }

    /// True if a symlink entry points at a regular file under the root
    fn is_contained_file_link(&self, entry: &DirEntry, canonical_root: Option<&Path>) -> bool {
        let path = entry.path();
        if !path.is_file() {
            debug!("Skipping symlink without a file target: {}", path.display());
            return false;
        }

        match (path.canonicalize(), canonical_root) {
            (Ok(target), Some(root)) if target.starts_with(root) => true,
            (Ok(target), _) => {
                warn!(
                    "Skipping symlink {} pointing outside dataset root: {}",
                    path.display(),
                    target.display()
                );
                false
            }
            (Err(e), _) => {
                warn!("Cannot resolve symlink {}: {}", path.display(), e);
                false
            }
        }
    }

    fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_counts_only_recognized_extensions() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            touch(dir.path(), &format!("day{}/embryo{}.jpg", i % 2, i));
        }
        touch(dir.path(), "a.PNG");
        touch(dir.path(), "nested/deep/b.Jpeg");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "nested/data.csv");
        touch(dir.path(), "noext");

        let index = ImageIndex::with_default_extensions(dir.path());
        let mut images = index.scan();
        images.sort();

        assert_eq!(images.len(), 6);
        assert!(images.contains(&"a.PNG".to_string()));
        assert!(images.contains(&"nested/deep/b.Jpeg".to_string()));
        assert!(images.contains(&"day0/embryo0.jpg".to_string()));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let index = ImageIndex::with_default_extensions(dir.path().join("missing"));
        assert!(index.list_images().is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_cache_persists_until_refresh() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "one.jpg");

        let index = ImageIndex::with_default_extensions(dir.path());
        assert_eq!(index.len(), 1);

        touch(dir.path(), "two.jpg");
        assert_eq!(index.len(), 1, "cached listing should be stale");
        assert_eq!(index.scan().len(), 2, "scan bypasses the cache");
        assert_eq!(index.len(), 1, "scan must not update the cache");

        assert_eq!(index.refresh(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_invalidate_forces_rescan() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "one.gif");
        let index = ImageIndex::with_default_extensions(dir.path());
        assert_eq!(index.len(), 1);

        fs::remove_file(dir.path().join("one.gif")).unwrap();
        index.invalidate();
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_custom_extensions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.tif");
        touch(dir.path(), "b.jpg");

        let index = ImageIndex::new(dir.path(), [".TIF"]);
        assert_eq!(index.scan(), vec!["a.tif".to_string()]);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "dataset/a.jpg");
        touch(dir.path(), "secret.jpg");
        let index = ImageIndex::with_default_extensions(dir.path().join("dataset"));

        assert!(index.resolve("a.jpg").is_ok());
        assert!(matches!(index.resolve("../secret.jpg"), Err(Error::AccessDenied(_))));
        assert!(matches!(index.resolve("/etc/passwd"), Err(Error::AccessDenied(_))));
        assert!(matches!(index.resolve("missing.jpg"), Err(Error::NotFound(_))));
        assert!(matches!(index.resolve(""), Err(Error::InvalidInput(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_includes_symlinked_files_inside_root() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "outside.jpg");
        touch(dir.path(), "dataset/raw/a.jpg");
        let dataset = dir.path().join("dataset");
        symlink(dataset.join("raw/a.jpg"), dataset.join("b.jpg")).unwrap();
        symlink(dir.path().join("outside.jpg"), dataset.join("escape.jpg")).unwrap();
        symlink(dataset.join("missing.jpg"), dataset.join("dangling.jpg")).unwrap();
        symlink(dataset.join("raw"), dataset.join("linked_dir")).unwrap();

        let index = ImageIndex::with_default_extensions(&dataset);
        let mut images = index.scan();
        images.sort();

        assert_eq!(images, vec!["b.jpg".to_string(), "raw/a.jpg".to_string()]);
        for image in &images {
            assert!(index.resolve(image).is_ok(), "indexed {} must resolve", image);
        }
        assert!(matches!(index.resolve("escape.jpg"), Err(Error::AccessDenied(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "secret.jpg");
        fs::create_dir_all(dir.path().join("dataset")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("secret.jpg"),
            dir.path().join("dataset/link.jpg"),
        )
        .unwrap();

        let index = ImageIndex::with_default_extensions(dir.path().join("dataset"));
        assert!(matches!(index.resolve("link.jpg"), Err(Error::AccessDenied(_))));
    }
}
