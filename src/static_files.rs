//! Static asset loading for the optional static-file pipeline step.
//!
//! The dispatcher only depends on the [`StaticSource`] boundary; the
//! filesystem-backed [`StaticFiles`] implementation ships for applications
//! serving assets straight from a directory.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Source of static assets consumed by the static-file pipeline step.
///
/// `path` is the request path with the leading slash stripped (the empty
/// path arrives as `index.html`). Returns the asset bytes plus a content
/// type, or `None` when the path maps to nothing.
pub trait StaticSource: Send + Sync {
    fn load(&self, path: &str) -> Option<(Vec<u8>, &'static str)>;
}

/// Filesystem-backed [`StaticSource`] rooted at a base directory.
///
/// Path mapping rejects parent-directory and absolute components, so a
/// request path can never escape the base directory.
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "ico" => "image/x-icon",
            _ => "application/octet-stream",
        }
    }
}

impl StaticSource for StaticFiles {
    fn load(&self, url_path: &str) -> Option<(Vec<u8>, &'static str)> {
        let path = self.map_path(url_path)?;
        if !path.is_file() {
            return None;
        }
        match fs::read(&path) {
            Ok(bytes) => Some((bytes, Self::content_type(&path))),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Static file unreadable");
                None
            }
        }
    }
}
