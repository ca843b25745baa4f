use crate::error::VfsError;
use crate::node::{FileNode, FileStat};
use crate::path::{self, ROOT};
use aussie_os_events::{EventBus, FileChangeKind, SystemEvent};
use aussie_os_storage::{keys, KeyValueStore};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const SEED_DIRECTORIES: [&str; 4] = ["/home/aussie/Desktop", "/workspace", "/workspace/system", "/tmp"];

type Changes = Vec<(String, FileChangeKind)>;

/// The simulated disk.
///
/// All operations are synchronous. Every mutation is broadcast as a
/// [`SystemEvent::FileChange`] and, when a store is attached, the whole tree
/// is saved under [`keys::VFS_TREE`].
pub struct VirtualFileSystem {
    root: Mutex<FileNode>,
    bus: EventBus,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl VirtualFileSystem {
    /// Fresh, seeded, unpersisted filesystem.
    pub fn new(bus: EventBus) -> Self {
        Self {
            root: Mutex::new(seeded_tree()),
            bus,
            store: None,
        }
    }

    /// Restore the tree from `store` (seeded default if absent or corrupt)
    /// and keep saving it there after every mutation.
    pub fn with_store(bus: EventBus, store: Arc<dyn KeyValueStore>) -> Self {
        let root = match store.get_raw(keys::VFS_TREE) {
            Ok(Some(raw)) => match serde_json::from_str::<FileNode>(&raw) {
                Ok(node) if node.is_dir() && node.path == ROOT => node,
                Ok(_) => {
                    warn!("Stored filesystem root is not a directory, reseeding");
                    seeded_tree()
                }
                Err(e) => {
                    warn!("Stored filesystem is corrupt, reseeding: {}", e);
                    seeded_tree()
                }
            },
            Ok(None) => seeded_tree(),
            Err(e) => {
                warn!("Failed to read stored filesystem, reseeding: {}", e);
                seeded_tree()
            }
        };

        Self {
            root: Mutex::new(root),
            bus,
            store: Some(store),
        }
    }

    pub fn read_file(&self, path: &str) -> Result<String, VfsError> {
        let canonical = path::normalize(path)?;
        let root = self.root.lock();
        match find(&root, &canonical) {
            Some(node) if !node.is_dir() => Ok(node.content.clone().unwrap_or_default()),
            _ => Err(VfsError::NotFound(canonical)),
        }
    }

    /// Create or overwrite (or append to) a file, creating missing parents.
    pub fn write_file(&self, path: &str, content: &str, append: bool) -> Result<(), VfsError> {
        let canonical = path::normalize(path)?;
        let (parent_path, name) =
            path::split_parent(&canonical).ok_or_else(|| VfsError::IsADirectory(canonical.clone()))?;
        let now = now_millis();
        let mut changes = Changes::new();

        {
            let mut root = self.root.lock();
            let parent = ensure_dir(&mut root, parent_path, now, &mut changes)?;
            let children = parent
                .children_mut()
                .ok_or_else(|| VfsError::NotADirectory(parent_path.to_string()))?;

            match children.get_mut(name) {
                Some(existing) if existing.is_dir() => {
                    return Err(VfsError::IsADirectory(canonical));
                }
                Some(existing) => {
                    let body = existing.content.get_or_insert_with(String::new);
                    if append {
                        body.push_str(content);
                    } else {
                        *body = content.to_string();
                    }
                    existing.last_modified = now;
                    changes.push((canonical.clone(), FileChangeKind::Modified));
                }
                None => {
                    children.insert(
                        name.to_string(),
                        FileNode::file(name, &canonical, content.to_string(), now),
                    );
                    changes.push((canonical.clone(), FileChangeKind::Created));
                }
            }
            parent.last_modified = now;
        }

        debug!("Wrote {} ({} bytes, append={})", canonical, content.len(), append);
        self.commit(changes);
        Ok(())
    }

    /// Create a directory (and any missing parents).
    pub fn mkdir(&self, path: &str) -> Result<(), VfsError> {
        let canonical = path::normalize(path)?;
        let now = now_millis();
        let mut changes = Changes::new();

        {
            let mut root = self.root.lock();
            if find(&root, &canonical).is_some() {
                return Err(VfsError::AlreadyExists(canonical));
            }
            ensure_dir(&mut root, &canonical, now, &mut changes)?;
        }

        self.commit(changes);
        Ok(())
    }

    /// Immediate children of a directory, ordered by name.
    pub fn read_dir(&self, path: &str) -> Result<Vec<FileStat>, VfsError> {
        let canonical = path::normalize(path)?;
        let root = self.root.lock();
        match find(&root, &canonical) {
            Some(node) if node.is_dir() => Ok(node
                .children
                .as_ref()
                .map(|children| children.values().map(FileNode::stat).collect())
                .unwrap_or_default()),
            _ => Err(VfsError::NotFound(canonical)),
        }
    }

    /// Remove a file, or a directory with its whole subtree.
    pub fn delete(&self, path: &str) -> Result<(), VfsError> {
        let canonical = path::normalize(path)?;
        let (parent_path, name) = path::split_parent(&canonical)
            .ok_or_else(|| VfsError::InvalidPath("cannot delete root".to_string()))?;

        {
            let mut root = self.root.lock();
            let parent = find_mut(&mut root, parent_path)
                .and_then(FileNode::children_mut)
                .ok_or_else(|| VfsError::NotFound(canonical.clone()))?;
            if parent.remove(name).is_none() {
                return Err(VfsError::NotFound(canonical));
            }
        }

        self.commit(vec![(canonical, FileChangeKind::Deleted)]);
        Ok(())
    }

    /// Move `source` to `dest`. The destination must not exist.
    pub fn move_path(&self, source: &str, dest: &str) -> Result<(), VfsError> {
        let source = path::normalize(source)?;
        let dest = path::normalize(dest)?;
        let (source_parent, source_name) = path::split_parent(&source)
            .ok_or_else(|| VfsError::InvalidPath("cannot move root".to_string()))?;
        let (dest_parent, dest_name) = path::split_parent(&dest)
            .ok_or_else(|| VfsError::AlreadyExists(dest.clone()))?;
        if path::is_within(&dest, &source) {
            return Err(VfsError::InvalidPath(format!(
                "cannot move {} into itself",
                source
            )));
        }

        let now = now_millis();
        let mut changes = Changes::new();

        {
            let mut root = self.root.lock();
            if find(&root, &source).is_none() {
                return Err(VfsError::NotFound(source));
            }
            if find(&root, &dest).is_some() {
                return Err(VfsError::AlreadyExists(dest));
            }
            ensure_dir(&mut root, dest_parent, now, &mut changes)?;

            let mut node = find_mut(&mut root, source_parent)
                .and_then(FileNode::children_mut)
                .and_then(|children| children.remove(source_name))
                .ok_or_else(|| VfsError::NotFound(source.clone()))?;
            node.name = dest_name.to_string();
            node.last_modified = now;
            node.relocate(&dest);

            let target = find_mut(&mut root, dest_parent)
                .and_then(FileNode::children_mut)
                .ok_or_else(|| VfsError::NotADirectory(dest_parent.to_string()))?;
            target.insert(dest_name.to_string(), node);
        }

        changes.push((source, FileChangeKind::Moved));
        changes.push((dest, FileChangeKind::Created));
        self.commit(changes);
        Ok(())
    }

    pub fn exists(&self, path: &str) -> bool {
        match path::normalize(path) {
            Ok(canonical) => find(&self.root.lock(), &canonical).is_some(),
            Err(_) => false,
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        match path::normalize(path) {
            Ok(canonical) => find(&self.root.lock(), &canonical)
                .map(FileNode::is_dir)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub fn stat(&self, path: &str) -> Result<FileStat, VfsError> {
        let canonical = path::normalize(path)?;
        let root = self.root.lock();
        find(&root, &canonical)
            .map(FileNode::stat)
            .ok_or(VfsError::NotFound(canonical))
    }

    /// Every file beneath `path`, keyed by absolute path.
    pub fn files_under(&self, path: &str) -> Result<BTreeMap<String, String>, VfsError> {
        let canonical = path::normalize(path)?;
        let root = self.root.lock();
        let node = find(&root, &canonical).ok_or_else(|| VfsError::NotFound(canonical.clone()))?;
        let mut files = BTreeMap::new();
        collect_files(node, &mut files);
        Ok(files)
    }

    pub fn snapshot(&self) -> FileNode {
        self.root.lock().clone()
    }

    pub fn restore(&self, tree: FileNode) -> Result<(), VfsError> {
        if !tree.is_dir() || tree.path != ROOT {
            return Err(VfsError::InvalidPath("snapshot root must be /".to_string()));
        }
        *self.root.lock() = tree;
        self.commit(vec![(ROOT.to_string(), FileChangeKind::Modified)]);
        Ok(())
    }

    /// Write the current tree to the backing store, if any.
    pub fn flush(&self) {
        self.persist();
    }

    fn commit(&self, changes: Changes) {
        self.persist();
        for (path, change) in changes {
            self.bus.emit(SystemEvent::FileChange { path, change });
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let serialized = {
            let root = self.root.lock();
            serde_json::to_string(&*root)
        };
        let result = serialized
            .map_err(|e| e.to_string())
            .and_then(|raw| store.set_raw(keys::VFS_TREE, &raw).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("Failed to persist filesystem: {}", e);
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn seeded_tree() -> FileNode {
    let now = now_millis();
    let mut root = FileNode::root(now);
    let mut ignored = Changes::new();
    for dir in SEED_DIRECTORIES {
        // Seed paths are static and contain no files, so this cannot fail.
        let _ = ensure_dir(&mut root, dir, now, &mut ignored);
    }
    root
}

fn find<'a>(root: &'a FileNode, canonical: &str) -> Option<&'a FileNode> {
    let mut current = root;
    for segment in path::segments(canonical) {
        current = current.child(segment)?;
    }
    Some(current)
}

fn find_mut<'a>(root: &'a mut FileNode, canonical: &str) -> Option<&'a mut FileNode> {
    let mut current = root;
    for segment in path::segments(canonical) {
        current = current.children.as_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Walk to `canonical`, creating missing directories on the way.
fn ensure_dir<'a>(
    root: &'a mut FileNode,
    canonical: &str,
    now: i64,
    changes: &mut Changes,
) -> Result<&'a mut FileNode, VfsError> {
    let mut current = root;
    for segment in path::segments(canonical) {
        let parent_path = current.path.clone();
        let child_path = path::join(&parent_path, segment);
        let children = current
            .children_mut()
            .ok_or(VfsError::NotADirectory(parent_path))?;
        let child = children.entry(segment.to_string()).or_insert_with(|| {
            changes.push((child_path.clone(), FileChangeKind::Created));
            FileNode::directory(segment, &child_path, now)
        });
        if !child.is_dir() {
            return Err(VfsError::NotADirectory(child_path));
        }
        current = child;
    }
    Ok(current)
}

fn collect_files(node: &FileNode, files: &mut BTreeMap<String, String>) {
    if node.is_dir() {
        if let Some(children) = &node.children {
            for child in children.values() {
                collect_files(child, files);
            }
        }
    } else {
        files.insert(node.path.clone(), node.content.clone().unwrap_or_default());
    }
}
