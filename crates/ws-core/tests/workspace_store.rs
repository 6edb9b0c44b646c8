use std::fs;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use ws_core::config::WorkspaceDefaults;
use ws_core::name::WorkspaceName;
use ws_core::session::{read_tabs, write_tabs, Tab};
use ws_core::workspace::{
    marker_path, update_workspace_meta, CreateOptions, MetaUpdate, Status, WorkspaceError,
    WorkspaceStore,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn name(raw: &str) -> WorkspaceName {
    WorkspaceName::parse(raw).expect("name")
}

fn create(store: &WorkspaceStore, raw: &str) {
    store
        .create(
            &name(raw),
            CreateOptions::default(),
            &WorkspaceDefaults::default(),
            day(2026, 1, 1),
        )
        .expect("create");
}

#[test]
fn create_then_exists_and_duplicate_fails() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    for raw in ["alpha", "client.api", "deep/nested/one"] {
        assert!(!store.exists(&name(raw)));
        create(&store, raw);
        assert!(store.exists(&name(raw)));

        let again = store.create(
            &name(raw),
            CreateOptions::default(),
            &WorkspaceDefaults::default(),
            day(2026, 1, 1),
        );
        assert!(matches!(again, Err(WorkspaceError::AlreadyExists { .. })));
    }
}

#[test]
fn update_only_changes_the_named_field() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    create(&store, "demo");
    let dir = store.path_of(&name("demo"));

    let before = fs::read_to_string(marker_path(&dir)).expect("before");
    update_workspace_meta(&dir, MetaUpdate::status(Status::Paused)).expect("update");
    let after = fs::read_to_string(marker_path(&dir)).expect("after");

    let changed: Vec<(&str, &str)> = before
        .lines()
        .zip(after.lines())
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(changed, vec![("status: active", "status: paused")]);
    assert_eq!(before.lines().count(), after.lines().count());
}

#[test]
fn tabs_are_empty_until_written_then_round_trip() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    create(&store, "demo");
    let dir = store.path_of(&name("demo"));

    assert!(read_tabs(&dir).is_empty());
    let tabs = vec![
        Tab::new("Issue 12", "https://tracker.example.com/12"),
        Tab::new("", "about:blank"),
    ];
    write_tabs(&dir, &tabs).expect("write");
    assert_eq!(read_tabs(&dir), tabs);
}

#[test]
fn find_all_returns_nested_workspaces_sorted() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    create(&store, "c");
    create(&store, "a/b");
    create(&store, "a");

    let names: Vec<String> = store
        .find_all()
        .iter()
        .map(|entry| entry.name.to_string())
        .collect();
    assert_eq!(names, vec!["a", "a/b", "c"]);
}

#[test]
fn tree_nests_children_without_duplicates() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    create(&store, "a");
    create(&store, "a/b");

    let tree = store.tree();
    assert_eq!(tree.children.len(), 1);
    let a = tree.child("a").expect("a");
    assert!(a.is_workspace);
    assert!(a.meta.is_some());
    assert_eq!(a.children.len(), 1);
    let b = a.child("b").expect("b");
    assert!(b.is_workspace);
    assert!(b.children.is_empty());
}

#[test]
fn tree_adds_grouping_nodes_for_plain_directories() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    create(&store, "clients/acme");

    let tree = store.tree();
    let clients = tree.child("clients").expect("clients");
    assert!(!clients.is_workspace);
    assert!(clients.meta.is_none());
    assert!(clients.child("acme").expect("acme").is_workspace);
}

#[test]
fn archiving_child_then_parent_merges() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    create(&store, "p");
    create(&store, "p/child");
    create(&store, "p/other");
    fs::write(store.path_of(&name("p")).join("notes.txt"), "parent notes").expect("notes");
    fs::write(store.path_of(&name("p/child")).join("log.txt"), "child log").expect("log");

    let first = store.move_to_archive(&name("p/child")).expect("archive child");
    assert!(!first.merged);
    let second = store.move_to_archive(&name("p")).expect("archive parent");
    assert!(second.merged);

    let archived = temp.path().join(".archive").join("p");
    assert_eq!(
        fs::read_to_string(archived.join("notes.txt")).expect("notes"),
        "parent notes"
    );
    assert_eq!(
        fs::read_to_string(archived.join("child").join("log.txt")).expect("log"),
        "child log"
    );
    assert!(marker_path(&archived.join("other")).is_file());
    assert!(!store.path_of(&name("p")).exists());
    assert!(store.find_all().is_empty());
}

#[test]
fn archiving_parent_then_recreated_child_merges() {
    let temp = TempDir::new().expect("tempdir");
    let store = WorkspaceStore::new(temp.path());
    create(&store, "p");
    create(&store, "p/child");
    fs::write(store.path_of(&name("p")).join("notes.txt"), "parent notes").expect("notes");
    fs::write(store.path_of(&name("p/child")).join("log.txt"), "old log").expect("log");

    let parent = store.move_to_archive(&name("p")).expect("archive parent");
    assert!(!parent.merged);
    assert!(!store.path_of(&name("p")).exists());

    create(&store, "p/child");
    fs::write(store.path_of(&name("p/child")).join("fresh.txt"), "new work").expect("fresh");
    let child = store.move_to_archive(&name("p/child")).expect("archive child");
    assert!(child.merged);

    let archived = temp.path().join(".archive").join("p");
    assert_eq!(child.destination, archived.join("child"));
    assert_eq!(
        fs::read_to_string(archived.join("notes.txt")).expect("notes"),
        "parent notes"
    );
    assert!(marker_path(&archived).is_file());
    assert!(marker_path(&archived.join("child")).is_file());
    assert_eq!(
        fs::read_to_string(archived.join("child").join("log.txt")).expect("log"),
        "old log"
    );
    assert_eq!(
        fs::read_to_string(archived.join("child").join("fresh.txt")).expect("fresh"),
        "new work"
    );
    assert!(!store.path_of(&name("p/child")).exists());
    assert!(store.find_all().is_empty());
}
