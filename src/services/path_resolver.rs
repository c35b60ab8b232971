use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use crate::services::fs_error::FsError;

/// Confines client supplied paths to the project root.
///
/// Resolution happens in two steps. The requested path is first joined onto the
/// root and normalized lexically, which rejects any `..` walk out of the root
/// without touching the disk. The deepest existing ancestor of the result is then
/// canonicalized so that a symlink inside the root cannot point the operation
/// somewhere else.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    canonical_root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FsError> {
        let root = lexical_normalize(root.as_ref());
        let canonical_root = std::fs::canonicalize(&root)?;
        Ok(Self {
            root,
            canonical_root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `requested` onto the root and reject the result if it leaves the root.
    /// Leading separators are ignored, `/etc/passwd` means `<root>/etc/passwd`.
    pub fn confine(&self, requested: &str) -> Result<PathBuf, FsError> {
        let mut joined = self.root.clone();
        for component in Path::new(requested).components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    joined.pop();
                }
                Component::Normal(part) => joined.push(part),
            }
        }

        if !joined.starts_with(&self.root) {
            warn!("Rejected path '{}' outside of project root", requested);
            return Err(FsError::AccessDenied);
        }
        Ok(joined)
    }

    /// [`confine`](Self::confine) followed by the symlink check.
    pub async fn resolve(&self, requested: &str) -> Result<PathBuf, FsError> {
        let path = self.confine(requested)?;
        self.ensure_real_path_inside(&path, requested).await?;
        Ok(path)
    }

    async fn ensure_real_path_inside(&self, path: &Path, requested: &str) -> Result<(), FsError> {
        let mut ancestor = path.to_path_buf();
        loop {
            match tokio::fs::canonicalize(&ancestor).await {
                Ok(real) if real.starts_with(&self.canonical_root) => return Ok(()),
                Ok(real) => {
                    warn!(
                        "Rejected path '{}': resolves to '{}' outside of project root",
                        requested,
                        real.display()
                    );
                    return Err(FsError::AccessDenied);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // A dangling link would be followed by a later create
                    if tokio::fs::symlink_metadata(&ancestor).await.is_ok() {
                        warn!("Rejected path '{}': dangling symlink", requested);
                        return Err(FsError::AccessDenied);
                    }
                    if !ancestor.pop() || !ancestor.starts_with(&self.root) {
                        return Err(FsError::AccessDenied);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Client facing form of a confined path: `/` separated and rooted at `/`.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        format!("/{}", parts.join("/"))
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
