use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::models::{FileContent, FileKind, FileNode, FileNotice, FileStats, SendMessage};
use crate::services::fs_error::FsError;
use crate::services::path_resolver::PathResolver;
use crate::ws::relay::BroadcastRelay;

/// Entry names left out of the project tree
const IGNORED_NAMES: &[&str] = &["node_modules"];

/// Result of a read on a path that may be a file or a directory
#[derive(Debug)]
pub enum ReadResult {
    File(FileContent),
    Directory(Vec<FileNode>),
}

/// Project file access confined to a root directory.
///
/// Every operation goes through the [`PathResolver`] before the disk is touched.
/// Writes and deletes notify every realtime connection once they succeed.
#[derive(Clone)]
pub struct FileService {
    resolver: Arc<PathResolver>,
    relay: BroadcastRelay,
    max_file_size: u64,
    max_tree_depth: usize,
}

impl FileService {
    pub fn new(
        resolver: PathResolver,
        relay: BroadcastRelay,
        max_file_size: u64,
        max_tree_depth: usize,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            relay,
            max_file_size,
            max_tree_depth,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Walk the whole project, skipping dot entries and `node_modules`
    pub async fn list_tree(&self) -> Result<FileNode, FsError> {
        let root = self.resolver.root().to_path_buf();
        let meta = tokio::fs::metadata(&root).await?;
        let children = self.walk(root.clone(), 1).await?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());
        let mut node = self.node(name, &root, &meta);
        node.children = Some(children);
        Ok(node)
    }

    fn walk(&self, dir: PathBuf, depth: usize) -> BoxFuture<'_, Result<Vec<FileNode>, FsError>> {
        async move {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            let mut nodes = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') || IGNORED_NAMES.contains(&name.as_str()) {
                    continue;
                }

                let path = entry.path();
                let is_link = entry.file_type().await?.is_symlink();
                let meta = match tokio::fs::metadata(&path).await {
                    Ok(meta) => meta,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        debug!("Skipping vanished or dangling entry {}", path.display());
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                let mut node = self.node(name, &path, &meta);
                if meta.is_dir() {
                    node.children = Some(if is_link {
                        debug!("Not descending into symlinked folder {}", path.display());
                        Vec::new()
                    } else if depth >= self.max_tree_depth {
                        warn!(
                            "Project tree truncated at depth {} in {}",
                            depth,
                            node.path
                        );
                        Vec::new()
                    } else {
                        self.walk(path, depth + 1).await?
                    });
                }
                nodes.push(node);
            }
            Ok(nodes)
        }
        .boxed()
    }

    /// Single level listing. Unlike [`list_tree`](Self::list_tree) nothing is filtered.
    pub async fn list_directory(&self, requested: &str) -> Result<Vec<FileNode>, FsError> {
        let path = self.resolver.resolve(requested).await?;
        self.list_entries(&path, requested).await
    }

    async fn list_entries(&self, dir: &Path, requested: &str) -> Result<Vec<FileNode>, FsError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| FsError::from_io(e, requested))?;
        let mut nodes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let meta = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) if e.kind() == ErrorKind::NotFound => tokio::fs::symlink_metadata(&path).await?,
                Err(e) => return Err(e.into()),
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            nodes.push(self.node(name, &path, &meta));
        }
        Ok(nodes)
    }

    /// Read a file, or list it if it turns out to be a directory
    pub async fn read(&self, requested: &str) -> Result<ReadResult, FsError> {
        let path = self.resolver.resolve(requested).await?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FsError::from_io(e, requested))?;
        if meta.is_dir() {
            Ok(ReadResult::Directory(self.list_entries(&path, requested).await?))
        } else {
            Ok(ReadResult::File(self.read_contents(&path, meta, requested).await?))
        }
    }

    pub async fn read_file(&self, requested: &str) -> Result<FileContent, FsError> {
        let path = self.resolver.resolve(requested).await?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FsError::from_io(e, requested))?;
        self.read_contents(&path, meta, requested).await
    }

    async fn read_contents(
        &self,
        path: &Path,
        meta: Metadata,
        requested: &str,
    ) -> Result<FileContent, FsError> {
        if meta.is_dir() {
            return Err(FsError::Io(std::io::Error::new(
                ErrorKind::Other,
                format!("'{}' is a directory", requested),
            )));
        }
        let limit = self.max_file_size;
        if meta.len() > limit {
            info!("Refusing to read '{}' ({} bytes)", requested, meta.len());
            return Err(FsError::PayloadTooLarge {
                size: meta.len(),
                limit,
            });
        }

        // Capped in case the file grew after the metadata check
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| FsError::from_io(e, requested))?;
        let mut buf = Vec::with_capacity(meta.len() as usize);
        file.take(limit.saturating_add(1)).read_to_end(&mut buf).await?;
        if buf.len() as u64 > limit {
            return Err(FsError::PayloadTooLarge {
                size: buf.len() as u64,
                limit,
            });
        }

        let size = buf.len() as u64;
        let content =
            String::from_utf8(buf).map_err(|_| FsError::InvalidContent(requested.to_string()))?;
        Ok(FileContent {
            content,
            stats: FileStats {
                size,
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
                created: meta.created().ok().map(DateTime::<Utc>::from),
            },
        })
    }

    /// Create missing parent folders, overwrite the file and announce `file_saved`
    pub async fn write_file(&self, requested: &str, content: &str) -> Result<FileNotice, FsError> {
        let path = self.resolver.resolve(requested).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        let notice = self.notice(&path);
        let n = self.relay.broadcast_all(SendMessage::FileSaved(notice.clone()));
        info!(
            "Saved '{}' ({} bytes), notified {} connection(s)",
            notice.file_path,
            content.len(),
            n
        );
        Ok(notice)
    }

    /// Remove a file and announce `file_deleted`
    pub async fn delete_file(&self, requested: &str) -> Result<FileNotice, FsError> {
        let path = self.resolver.resolve(requested).await?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| FsError::from_io(e, requested))?;

        let notice = self.notice(&path);
        let n = self.relay.broadcast_all(SendMessage::FileDeleted(notice.clone()));
        info!("Deleted '{}', notified {} connection(s)", notice.file_path, n);
        Ok(notice)
    }

    fn notice(&self, path: &Path) -> FileNotice {
        FileNotice {
            file_path: self.resolver.relative(path),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    fn node(&self, name: String, path: &Path, meta: &Metadata) -> FileNode {
        FileNode {
            name,
            path: self.resolver.relative(path),
            kind: if meta.is_dir() {
                FileKind::Folder
            } else {
                FileKind::File
            },
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            children: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    const FIVE_MIB: u64 = 5 * 1024 * 1024;

    fn service_with_depth(max_tree_depth: usize) -> (TempDir, BroadcastRelay, FileService) {
        let dir = tempfile::tempdir().unwrap();
        let relay = BroadcastRelay::new();
        let resolver = PathResolver::new(dir.path()).unwrap();
        let service = FileService::new(resolver, relay.clone(), FIVE_MIB, max_tree_depth);
        (dir, relay, service)
    }

    fn service() -> (TempDir, BroadcastRelay, FileService) {
        service_with_depth(32)
    }

    fn names(nodes: &[FileNode]) -> HashSet<String> {
        nodes.iter().map(|n| n.name.clone()).collect()
    }

    fn find<'a>(nodes: &'a [FileNode], name: &str) -> &'a FileNode {
        nodes
            .iter()
            .find(|n| n.name == name)
            .unwrap_or_else(|| panic!("{name} missing"))
    }

    fn assert_no_hidden(nodes: &[FileNode]) {
        for node in nodes {
            assert!(!node.name.starts_with('.'), "{} listed", node.path);
            assert_ne!(node.name, "node_modules", "{} listed", node.path);
            if let Some(children) = &node.children {
                assert_no_hidden(children);
            }
        }
    }

    #[tokio::test]
    async fn tree_skips_hidden_entries_at_every_depth() {
        let (dir, _relay, service) = service();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/nested/.cache")).unwrap();
        std::fs::create_dir_all(root.join("src/node_modules/pkg")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".env"), "SECRET=1").unwrap();
        std::fs::write(root.join("README.md"), "# hi").unwrap();
        std::fs::write(root.join("src/main.ts"), "main()").unwrap();
        std::fs::write(root.join("src/nested/.hidden.ts"), "").unwrap();
        std::fs::write(root.join("src/nested/util.ts"), "util()").unwrap();

        let tree = service.list_tree().await.unwrap();
        assert!(tree.is_folder());
        assert_eq!(tree.path, "/");
        let children = tree.children.as_deref().unwrap();
        assert_no_hidden(children);
        assert_eq!(
            names(children),
            HashSet::from(["README.md".to_string(), "src".to_string()])
        );

        let src = find(children, "src");
        assert_eq!(src.path, "/src");
        let src_children = src.children.as_deref().unwrap();
        assert_eq!(
            names(src_children),
            HashSet::from(["main.ts".to_string(), "nested".to_string()])
        );
        let nested = find(src_children, "nested");
        let util = find(nested.children.as_deref().unwrap(), "util.ts");
        assert_eq!(util.path, "/src/nested/util.ts");
        assert_eq!(util.kind, FileKind::File);
        assert_eq!(util.size, 6);
        assert!(util.children.is_none());
    }

    #[tokio::test]
    async fn tree_walk_stops_at_max_depth() {
        let (dir, _relay, service) = service_with_depth(2);
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("a/b/c/deep.txt"), "deep").unwrap();

        let tree = service.list_tree().await.unwrap();
        let a = find(tree.children.as_deref().unwrap(), "a");
        let b = find(a.children.as_deref().unwrap(), "b");
        assert!(b.is_folder());
        assert_eq!(b.children.as_deref().map(|c| c.len()), Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tree_does_not_descend_into_symlinked_folders() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "x").unwrap();
        let (dir, _relay, service) = service();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

        let tree = service.list_tree().await.unwrap();
        let linked = find(tree.children.as_deref().unwrap(), "linked");
        assert!(linked.is_folder());
        assert!(linked.children.as_deref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn directory_listing_is_not_filtered() {
        let (dir, _relay, service) = service();
        std::fs::create_dir_all(dir.path().join("pkg/node_modules")).unwrap();
        std::fs::write(dir.path().join("pkg/.npmrc"), "").unwrap();
        std::fs::write(dir.path().join("pkg/index.js"), "").unwrap();

        let listing = service.list_directory("pkg").await.unwrap();
        assert_eq!(
            names(&listing),
            HashSet::from([
                "node_modules".to_string(),
                ".npmrc".to_string(),
                "index.js".to_string()
            ])
        );
        assert_eq!(find(&listing, "node_modules").kind, FileKind::Folder);
        assert_eq!(find(&listing, "index.js").path, "/pkg/index.js");
        assert!(listing.iter().all(|n| n.children.is_none()));
    }

    #[tokio::test]
    async fn read_dispatches_on_directories() {
        let (dir, _relay, service) = service();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/a.md"), "a").unwrap();

        match service.read("docs").await.unwrap() {
            ReadResult::Directory(nodes) => assert_eq!(names(&nodes), HashSet::from(["a.md".to_string()])),
            other => panic!("expected a listing, got {other:?}"),
        }
        match service.read("docs/a.md").await.unwrap() {
            ReadResult::File(file) => assert_eq!(file.content, "a"),
            other => panic!("expected a file, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let (_dir, _relay, service) = service();
        let content = "fn main() {\n    println!(\"héllo 🌍\");\n}\n";
        service.write_file("src/main.rs", content).await.unwrap();

        let file = service.read_file("src/main.rs").await.unwrap();
        assert_eq!(file.content, content);
        assert_eq!(file.stats.size, content.len() as u64);
        assert!(file.stats.modified.is_some());
    }

    #[tokio::test]
    async fn writing_twice_leaves_the_same_state() {
        let (dir, _relay, service) = service();
        service.write_file("a.txt", "longer original text").await.unwrap();
        service.write_file("a.txt", "same").await.unwrap();
        service.write_file("a.txt", "same").await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "same");
    }

    #[tokio::test]
    async fn racing_writers_end_with_one_complete_write() {
        let (_dir, _relay, service) = service();
        let first = "a".repeat(64 * 1024);
        let second = "b".repeat(64 * 1024);
        let (r1, r2) = tokio::join!(
            service.write_file("race.txt", &first),
            service.write_file("race.txt", &second)
        );
        r1.unwrap();
        r2.unwrap();

        // No serialization between writers, whichever finished last wins
        let content = service.read_file("race.txt").await.unwrap().content;
        assert!(content == first || content == second);
    }

    #[tokio::test]
    async fn write_creates_parents_and_notifies_everyone() {
        let (dir, relay, service) = service();
        let (_a, mut rx_a) = relay.connect();
        let (_b, mut rx_b) = relay.connect();

        let notice = service.write_file("src/new.ts", "export const x=1;").await.unwrap();
        assert_eq!(notice.file_path, "/src/new.ts");
        assert!(dir.path().join("src").is_dir());

        for rx in [&mut rx_a, &mut rx_b] {
            match rx.try_recv().unwrap() {
                SendMessage::FileSaved(saved) => assert_eq!(saved.file_path, "/src/new.ts"),
                other => panic!("unexpected message {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_reading() {
        let (dir, _relay, service) = service();
        let file = std::fs::File::create(dir.path().join("big.bin")).unwrap();
        file.set_len(FIVE_MIB + 1).unwrap();

        match service.read_file("big.bin").await {
            Err(FsError::PayloadTooLarge { size, limit }) => {
                assert_eq!(size, FIVE_MIB + 1);
                assert_eq!(limit, FIVE_MIB);
            }
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_at_the_ceiling_is_read() {
        let (dir, _relay, service) = service();
        std::fs::write(dir.path().join("edge.txt"), "x".repeat(FIVE_MIB as usize)).unwrap();
        let file = service.read_file("edge.txt").await.unwrap();
        assert_eq!(file.content.len() as u64, FIVE_MIB);
    }

    #[tokio::test]
    async fn unbounded_ceiling_still_reads() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        let service = FileService::new(resolver, BroadcastRelay::new(), u64::MAX, 32);
        std::fs::write(dir.path().join("notes.md"), "# notes").unwrap();

        let file = service.read_file("notes.md").await.unwrap();
        assert_eq!(file.content, "# notes");
    }

    #[tokio::test]
    async fn binary_content_is_rejected() {
        let (dir, _relay, service) = service();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            service.read_file("blob.bin").await,
            Err(FsError::InvalidContent(_))
        ));
    }

    #[tokio::test]
    async fn missing_files_are_not_found() {
        let (_dir, relay, service) = service();
        let (_a, mut rx) = relay.connect();
        assert!(matches!(service.read_file("nope.txt").await, Err(FsError::NotFound(_))));
        assert!(matches!(service.delete_file("nope.txt").await, Err(FsError::NotFound(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn delete_removes_file_and_notifies() {
        let (dir, relay, service) = service();
        std::fs::write(dir.path().join("gone.txt"), "bye").unwrap();
        let (_a, mut rx) = relay.connect();

        service.delete_file("gone.txt").await.unwrap();
        assert!(!dir.path().join("gone.txt").exists());
        match rx.try_recv().unwrap() {
            SendMessage::FileDeleted(notice) => {
                assert_eq!(notice.file_path, "/gone.txt");
                assert!(notice.timestamp > 0);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[tokio::test]
    async fn escapes_are_denied_without_touching_disk() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("project");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(parent.path().join("victim.txt"), "keep me").unwrap();

        let relay = BroadcastRelay::new();
        let (_a, mut rx) = relay.connect();
        let service = FileService::new(PathResolver::new(&root).unwrap(), relay, FIVE_MIB, 32);

        for requested in ["../victim.txt", "src/../../victim.txt", "../escaped/new.txt"] {
            assert!(matches!(service.read_file(requested).await, Err(FsError::AccessDenied)));
            assert!(matches!(service.read(requested).await, Err(FsError::AccessDenied)));
            assert!(matches!(
                service.write_file(requested, "pwned").await,
                Err(FsError::AccessDenied)
            ));
            assert!(matches!(service.delete_file(requested).await, Err(FsError::AccessDenied)));
        }
        assert!(matches!(service.list_directory("..").await, Err(FsError::AccessDenied)));

        assert_eq!(
            std::fs::read_to_string(parent.path().join("victim.txt")).unwrap(),
            "keep me"
        );
        assert!(!parent.path().join("escaped").exists());
        assert!(rx.try_recv().is_err());
    }
}
