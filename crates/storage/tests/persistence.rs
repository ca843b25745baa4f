use aussie_os_storage::*;

#[test]
fn test_file_store_round_trip_across_instances() {
    let dir = tempfile::tempdir().unwrap();

    let store = FileStore::new(dir.path()).unwrap();
    let mut state = UiState::default();
    state.sidebar_collapsed = true;
    state.last_view = MainView::Deploy;
    state
        .desktop_icons
        .insert("notes.txt".to_string(), DesktopIcon { x: 40, y: 80 });
    state.save(&store).unwrap();

    let reopened = FileStore::new(dir.path()).unwrap();
    let loaded = UiState::load(&reopened);
    assert_eq!(loaded, state);
}

#[test]
fn test_missing_entries_fall_back_to_defaults() {
    let store = MemoryStore::new();
    let loaded = UiState::load(&store);
    assert_eq!(loaded, UiState::default());
    assert_eq!(loaded.dashboard_layout.len(), 3);
}

#[test]
fn test_corrupt_entry_only_resets_that_entry() {
    let store = MemoryStore::new();
    store.set_raw(keys::LAST_VIEW, "\"browser\"").unwrap();
    store.set_raw(keys::DASHBOARD_LAYOUT, "{not json").unwrap();
    store.set_raw(keys::SIDEBAR_COLLAPSED, "42").unwrap();

    let loaded = UiState::load(&store);
    assert_eq!(loaded.last_view, MainView::Browser);
    assert_eq!(loaded.dashboard_layout, UiState::default().dashboard_layout);
    assert!(!loaded.sidebar_collapsed);
}

#[test]
fn test_record_view() {
    let store = MemoryStore::new();
    UiState::record_view(&store, MainView::Marketplace).unwrap();
    assert_eq!(UiState::load(&store).last_view, MainView::Marketplace);
}

#[test]
fn test_main_view_parsing() {
    assert_eq!("code".parse::<MainView>(), Ok(MainView::Code));
    assert!("desktop".parse::<MainView>().is_err());
    assert_eq!(MainView::Github.to_string(), "github");
}
