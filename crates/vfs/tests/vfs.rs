use aussie_os_events::{EventBus, EventKind, FileChangeKind, SystemEvent};
use aussie_os_storage::{FileStore, KeyValueStore, MemoryStore};
use aussie_os_vfs::*;
use parking_lot::Mutex;
use std::sync::Arc;

fn record_changes(bus: &EventBus) -> Arc<Mutex<Vec<(String, FileChangeKind)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    bus.on(EventKind::FileChange, move |event| {
        if let SystemEvent::FileChange { path, change } = event {
            s.lock().push((path.clone(), *change));
        }
    });
    seen
}

#[test]
fn test_write_then_read_and_list() {
    let bus = EventBus::new();
    let changes = record_changes(&bus);
    let vfs = VirtualFileSystem::new(bus);

    vfs.write_file("/workspace/notes.txt", "hello", false).unwrap();
    assert_eq!(vfs.read_file("/workspace/notes.txt").unwrap(), "hello");

    let listing = vfs.read_dir("/workspace").unwrap();
    let names: Vec<_> = listing.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["notes.txt", "system"]);
    assert_eq!(listing[0].size, 5);
    assert_eq!(listing[0].language.as_deref(), Some("plaintext"));

    assert_eq!(
        changes.lock().as_slice(),
        &[("/workspace/notes.txt".to_string(), FileChangeKind::Created)]
    );
}

#[test]
fn test_overwrite_and_append() {
    let bus = EventBus::new();
    let changes = record_changes(&bus);
    let vfs = VirtualFileSystem::new(bus);

    vfs.write_file("/tmp/log.txt", "a", false).unwrap();
    vfs.write_file("/tmp/log.txt", "b", true).unwrap();
    assert_eq!(vfs.read_file("/tmp/log.txt").unwrap(), "ab");

    vfs.write_file("/tmp/log.txt", "c", false).unwrap();
    assert_eq!(vfs.read_file("/tmp/log.txt").unwrap(), "c");

    let kinds: Vec<_> = changes.lock().iter().map(|(_, k)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            FileChangeKind::Created,
            FileChangeKind::Modified,
            FileChangeKind::Modified
        ]
    );
}

#[test]
fn test_write_creates_missing_parents() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    vfs.write_file("/workspace/app/src/main.rs", "fn main() {}", false)
        .unwrap();
    assert!(vfs.is_dir("/workspace/app"));
    assert!(vfs.is_dir("/workspace/app/src"));
    assert_eq!(
        vfs.stat("/workspace/app/src/main.rs").unwrap().language.as_deref(),
        Some("rust")
    );
}

#[test]
fn test_read_errors() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    assert_eq!(
        vfs.read_file("/workspace/missing.txt"),
        Err(VfsError::NotFound("/workspace/missing.txt".to_string()))
    );
    assert!(matches!(vfs.read_file("/workspace"), Err(VfsError::NotFound(_))));
    assert!(matches!(vfs.read_dir("/nope"), Err(VfsError::NotFound(_))));
    assert!(matches!(vfs.read_file("relative.txt"), Err(VfsError::InvalidPath(_))));
}

#[test]
fn test_write_over_directory_fails() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    assert!(matches!(
        vfs.write_file("/workspace", "x", false),
        Err(VfsError::IsADirectory(_))
    ));
    assert!(matches!(
        vfs.write_file("/", "x", false),
        Err(VfsError::IsADirectory(_))
    ));
}

#[test]
fn test_mkdir_twice_fails() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    vfs.mkdir("/workspace/project").unwrap();
    assert_eq!(
        vfs.mkdir("/workspace/project"),
        Err(VfsError::AlreadyExists("/workspace/project".to_string()))
    );
    assert!(matches!(vfs.mkdir("/"), Err(VfsError::AlreadyExists(_))));

    let listing = vfs.read_dir("/workspace").unwrap();
    assert_eq!(listing.iter().filter(|s| s.name == "project").count(), 1);
}

#[test]
fn test_delete_removes_subtree() {
    let bus = EventBus::new();
    let vfs = VirtualFileSystem::new(bus.clone());
    vfs.write_file("/workspace/app/a.txt", "1", false).unwrap();
    vfs.write_file("/workspace/app/lib/b.txt", "2", false).unwrap();

    let changes = record_changes(&bus);
    vfs.delete("/workspace/app").unwrap();

    assert!(!vfs.exists("/workspace/app"));
    assert!(!vfs.exists("/workspace/app/lib/b.txt"));
    assert_eq!(
        changes.lock().as_slice(),
        &[("/workspace/app".to_string(), FileChangeKind::Deleted)]
    );
    assert!(matches!(vfs.delete("/workspace/app"), Err(VfsError::NotFound(_))));
    assert!(matches!(vfs.delete("/"), Err(VfsError::InvalidPath(_))));
}

#[test]
fn test_move_relocates_paths() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    vfs.write_file("/workspace/old/inner/file.md", "# hi", false)
        .unwrap();

    vfs.move_path("/workspace/old", "/tmp/new").unwrap();

    assert!(!vfs.exists("/workspace/old"));
    assert_eq!(vfs.read_file("/tmp/new/inner/file.md").unwrap(), "# hi");
    assert_eq!(
        vfs.stat("/tmp/new/inner/file.md").unwrap().path,
        "/tmp/new/inner/file.md"
    );
}

#[test]
fn test_move_errors() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    vfs.write_file("/tmp/a.txt", "a", false).unwrap();
    vfs.write_file("/tmp/b.txt", "b", false).unwrap();

    assert!(matches!(
        vfs.move_path("/tmp/missing", "/tmp/c"),
        Err(VfsError::NotFound(_))
    ));
    assert!(matches!(
        vfs.move_path("/tmp/a.txt", "/tmp/b.txt"),
        Err(VfsError::AlreadyExists(_))
    ));
    assert!(matches!(
        vfs.move_path("/workspace", "/workspace/system/inside"),
        Err(VfsError::InvalidPath(_))
    ));
    assert_eq!(vfs.read_file("/tmp/b.txt").unwrap(), "b");
}

#[test]
fn test_files_under() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    vfs.write_file("/workspace/repo/a.txt", "a", false).unwrap();
    vfs.write_file("/workspace/repo/src/b.rs", "b", false).unwrap();

    let files = vfs.files_under("/workspace/repo").unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files["/workspace/repo/src/b.rs"], "b");
}

#[test]
fn test_tree_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()).unwrap());
        let vfs = VirtualFileSystem::with_store(EventBus::new(), store);
        vfs.write_file("/workspace/notes.txt", "persisted", false)
            .unwrap();
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()).unwrap());
    let vfs = VirtualFileSystem::with_store(EventBus::new(), store);
    assert_eq!(vfs.read_file("/workspace/notes.txt").unwrap(), "persisted");
}

#[test]
fn test_corrupt_tree_reseeds() {
    let store = Arc::new(MemoryStore::new());
    store
        .set_raw(aussie_os_storage::keys::VFS_TREE, "{broken")
        .unwrap();

    let vfs = VirtualFileSystem::with_store(EventBus::new(), store);
    assert!(vfs.is_dir("/workspace/system"));
}

#[test]
fn test_snapshot_restore() {
    let vfs = VirtualFileSystem::new(EventBus::new());
    let before = vfs.snapshot();
    vfs.write_file("/tmp/scratch.txt", "x", false).unwrap();

    vfs.restore(before).unwrap();
    assert!(!vfs.exists("/tmp/scratch.txt"));

    let not_root = FileNode::directory("tmp", "/tmp", 0);
    assert!(vfs.restore(not_root).is_err());
}
