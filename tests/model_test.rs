//! Integration tests for the tree-table model: row mapping, insertion,
//! removal, copy, move, sort and placeholder promotion.

use std::fs;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use btbookmarks::application::{BookmarksModel, LayoutChange, ModelIndex, NEW_FOLDER_NAME};
use btbookmarks::config::Settings;
use btbookmarks::domain::{ItemFlags, ItemType, ModuleInfo, ModuleType, SortOrder};
use btbookmarks::infrastructure::di::ServiceContainer;
use btbookmarks::infrastructure::traits::{IdentityKeyNormalizer, RealFileSystem};
use btbookmarks::infrastructure::ModuleCatalog;
use btbookmarks::util::testing::{init_test_setup, ManualClock};

// Rows:
// [0] Psalms
//     [0] Shepherd              (Psalms 23:1, titled)
//     [1] Praise
//         [0] Psalms 150:6 (KJV)
// [1] Gospels
// [2] Genesis 1:1 (KJV)
const LIBRARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SwordBookmarks syntaxVersion="1">
 <Folder caption="Psalms">
  <Bookmark key="Psalms 23:1" modulename="KJV" description="comfort" title="Shepherd"/>
  <Folder caption="Praise">
   <Bookmark key="Psalms 150:6" modulename="KJV"/>
  </Folder>
 </Folder>
 <Folder caption="Gospels"/>
 <Bookmark key="Genesis 1:1" modulename="KJV"/>
</SwordBookmarks>"#;

fn container(dir: &TempDir) -> ServiceContainer {
    init_test_setup();
    let settings = Settings {
        base_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        Arc::new(ModuleCatalog::new([ModuleInfo::new(
            "KJV",
            ModuleType::Bible,
        )])),
        Arc::new(IdentityKeyNormalizer),
        Arc::new(ManualClock::new()),
    )
}

/// Plain model holding the library; never saves on its own.
fn library(dir: &TempDir) -> BookmarksModel {
    let path = dir.path().join("library.xml");
    fs::write(&path, LIBRARY).unwrap();
    container(dir).open_model_from(&path).unwrap()
}

/// Auto-saving model holding the library.
fn default_library(dir: &TempDir) -> BookmarksModel {
    let container = container(dir);
    fs::write(container.settings.bookmarks_path(), LIBRARY).unwrap();
    container.open_default_model().unwrap()
}

fn root() -> ModelIndex {
    ModelIndex::invalid()
}

fn at(model: &BookmarksModel, rows: &[usize]) -> ModelIndex {
    rows.iter().fold(root(), |parent, &row| {
        let index = model.index(row, 0, &parent);
        assert!(index.is_valid(), "no item at {:?}", rows);
        index
    })
}

fn texts(model: &BookmarksModel, parent: &ModelIndex) -> Vec<String> {
    (0..model.row_count(parent))
        .map(|row| {
            model
                .attributes(&model.index(row, 0, parent))
                .map(|a| a.text)
                .unwrap_or_default()
        })
        .collect()
}

fn snapshot(model: &BookmarksModel) -> String {
    model.store().serialize(None).unwrap()
}

// ============================================================
// Structure
// ============================================================

#[test]
fn given_library_when_indexing_then_rows_and_parents_mirror_the_tree() {
    let dir = TempDir::new().unwrap();
    let model = library(&dir);

    assert_eq!(texts(&model, &root()), ["Psalms", "Gospels", "Genesis 1:1 (KJV)"]);
    assert_eq!(model.column_count(&root()), 1);

    let psalms = at(&model, &[0]);
    let praise = at(&model, &[0, 1]);
    assert_eq!(model.parent(&psalms), root());
    assert_eq!(model.parent(&praise), psalms);
    assert_eq!(model.parent(&at(&model, &[0, 1, 0])), praise);
    assert!(model.has_children(&praise));
    assert!(!model.has_children(&at(&model, &[1])));

    assert!(!model.index(3, 0, &root()).is_valid());
    assert!(!model.index(0, 1, &root()).is_valid());
}

#[test]
fn given_library_when_querying_items_then_types_and_payloads_are_reported() {
    let dir = TempDir::new().unwrap();
    let model = library(&dir);
    let shepherd = at(&model, &[0, 0]);
    let psalms = at(&model, &[0]);

    assert!(model.is_bookmark(&shepherd));
    assert!(!model.is_folder(&shepherd));
    assert_eq!(model.key(&shepherd), "Psalms 23:1");
    assert_eq!(model.description(&shepherd), "comfort");
    assert_eq!(model.flags(&shepherd), ItemFlags::BOOKMARK);

    assert!(model.is_folder(&psalms));
    assert!(model.module(&psalms).is_none());
    assert_eq!(model.flags(&psalms), ItemFlags::FOLDER);
    assert_eq!(model.attributes(&psalms).unwrap().item_type, ItemType::Folder);
}

#[test]
fn given_nested_folders_when_checking_descendants_then_self_and_subtree_match() {
    let dir = TempDir::new().unwrap();
    let model = library(&dir);
    let psalms = at(&model, &[0]);

    assert!(model.has_descendant(&psalms, &psalms));
    assert!(model.has_descendant(&psalms, &at(&model, &[0, 0])));
    assert!(model.has_descendant(&psalms, &at(&model, &[0, 1, 0])));
    assert!(!model.has_descendant(&psalms, &at(&model, &[1])));
    assert!(!model.has_descendant(&at(&model, &[2]), &at(&model, &[2])));
}

// ============================================================
// Insert, promote, remove
// ============================================================

#[test]
fn given_default_store_when_rows_inserted_then_placeholders_are_not_persisted_until_promoted() {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);
    let gospels = at(&model, &[1]);

    assert!(model.insert_rows(0, 2, &gospels));
    assert_eq!(model.row_count(&gospels), 2);
    assert!(!model.store().save_pending());

    let placeholder = model.index(0, 0, &gospels);
    let attributes = model.attributes(&placeholder).unwrap();
    assert_eq!(attributes.item_type, ItemType::Folder);
    assert_eq!(attributes.flags, ItemFlags::empty());
    assert!(model.set_text(&placeholder, "draft"));
    assert!(!model.store().save_pending());

    let kjv = model.store().find_module("KJV").unwrap();
    assert!(model.promote_to_bookmark(&placeholder, &kjv, "John 1:1", "word", ""));
    assert!(model.store().save_pending());
    assert_eq!(model.attributes(&placeholder).unwrap().text, "John 1:1 (KJV)");

    let second = model.index(1, 0, &gospels);
    assert!(model.promote_to_folder(&second, ""));
    assert_eq!(model.attributes(&second).unwrap().text, NEW_FOLDER_NAME);
    assert!(!model.promote_to_folder(&second, "again"));
}

#[test]
fn given_bookmark_parent_when_rows_inserted_then_refused() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);
    let genesis = at(&model, &[2]);
    let before = snapshot(&model);

    assert!(!model.insert_rows(0, 1, &genesis));

    assert_eq!(model.row_count(&genesis), 0);
    assert_eq!(snapshot(&model), before);
}

#[test]
fn given_folder_when_renamed_then_store_is_marked_dirty() {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);

    assert!(model.set_text(&at(&model, &[1]), "Evangelists"));

    assert!(model.store().save_pending());
    assert_eq!(texts(&model, &root())[1], "Evangelists");
}

#[test]
fn given_rows_when_removed_then_count_drops_and_destroyed_items_are_unreachable() {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);
    let psalms = at(&model, &[0]);
    let praise_verse = at(&model, &[0, 1, 0]);

    assert!(model.remove_rows(0, 2, &root()));

    assert_eq!(model.row_count(&root()), 1);
    assert_eq!(texts(&model, &root()), ["Genesis 1:1 (KJV)"]);
    assert!(model.resolve(&psalms).is_none());
    assert!(model.resolve(&praise_verse).is_none());
    assert!(model.attributes(&praise_verse).is_none());
    assert!(model.store().save_pending());
}

#[test]
fn given_too_many_rows_when_removed_then_nothing_changes() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);
    let before = snapshot(&model);

    assert!(!model.remove_rows(2, 2, &root()));
    assert!(!model.remove_rows(0, 0, &root()));

    assert_eq!(snapshot(&model), before);
}

// ============================================================
// Adding items
// ============================================================

#[rstest]
#[case(-1, 2)]
#[case(-2, 1)]
#[case(0, 0)]
fn given_row_when_adding_bookmark_then_negative_rows_count_from_the_end(
    #[case] row: isize,
    #[case] expected_row: usize,
) {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);
    let psalms = at(&model, &[0]);
    let kjv = model.store().find_module("KJV").unwrap();

    let index = model
        .add_bookmark(row, &psalms, &kjv, "Psalms 1:1", "", "Blessed")
        .unwrap();

    assert_eq!(index.row(), expected_row);
    assert_eq!(model.row_count(&psalms), 3);
    assert_eq!(texts(&model, &psalms)[expected_row], "Blessed");
}

#[test]
fn given_bookmark_parent_when_adding_then_nothing_is_added() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);
    let genesis = at(&model, &[2]);
    let kjv = model.store().find_module("KJV").unwrap();

    assert!(model.add_bookmark(-1, &genesis, &kjv, "Gen 1:2", "", "").is_none());
    assert!(model.add_folder(0, &genesis, "x").is_none());
    assert!(model.add_bookmark(-10, &root(), &kjv, "Gen 1:2", "", "").is_none());
}

#[test]
fn given_empty_name_when_adding_folder_then_default_caption_is_used() {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);

    let index = model.add_folder(3, &root(), "").unwrap();

    assert_eq!(model.attributes(&index).unwrap().text, NEW_FOLDER_NAME);
    assert!(model.store().save_pending());
}

// ============================================================
// Copy
// ============================================================

#[test]
fn given_bookmarks_when_copied_then_duplicates_land_at_row_in_selection_order() {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);
    let gospels = at(&model, &[1]);
    let selection = [at(&model, &[2]), at(&model, &[0, 0])];

    let copies = model.copy_items(0, &gospels, &selection);

    assert_eq!(copies.len(), 2);
    assert_eq!(
        texts(&model, &gospels),
        ["Genesis 1:1 (KJV)", "Shepherd"]
    );
    assert_eq!(model.description(&copies[1]), "comfort");
    assert_eq!(texts(&model, &root()).len(), 3);
    assert!(model.store().save_pending());
}

#[test]
fn given_folder_when_copied_then_deep_copy_is_independent_of_original() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);
    let gospels = at(&model, &[1]);

    let copies = model.copy_items(0, &gospels, &[at(&model, &[0])]);
    assert_eq!(copies.len(), 1);
    let copy = copies[0];

    assert!(model.remove_rows(0, 1, &root()));

    let gospels = at(&model, &[0]);
    assert_eq!(model.parent(&copy), gospels);
    assert_eq!(texts(&model, &copy), ["Shepherd", "Praise"]);
    assert_eq!(
        texts(&model, &model.index(1, 0, &copy)),
        ["Psalms 150:6 (KJV)"]
    );
}

#[rstest]
#[case::two_folders(&[&[0][..], &[1][..]], &[])]
#[case::folder_with_bookmark(&[&[1][..], &[2][..]], &[])]
#[case::folder_into_itself(&[&[0][..]], &[0])]
#[case::folder_into_descendant(&[&[0][..]], &[0, 1])]
#[case::into_bookmark(&[&[2][..]], &[0, 0])]
fn given_invalid_selection_when_copied_or_moved_then_rejected_and_tree_unchanged(
    #[case] selection: &[&[usize]],
    #[case] destination: &[usize],
    #[values(false, true)] relocate: bool,
) {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);
    let before = snapshot(&model);
    let sources: Vec<ModelIndex> = selection.iter().map(|rows| at(&model, rows)).collect();
    let dest = at(&model, destination);

    let placed = if relocate {
        model.move_items(0, &dest, &sources)
    } else {
        model.copy_items(0, &dest, &sources)
    };

    assert!(placed.is_empty());

    assert_eq!(snapshot(&model), before);
    assert!(!model.store().save_pending());
}

#[test]
fn given_placeholder_in_selection_when_copied_then_rejected() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);
    model.insert_rows(0, 1, &root());

    let copies = model.copy_items(0, &at(&model, &[2]), &[at(&model, &[0])]);

    assert!(copies.is_empty());
}

// ============================================================
// Move
// ============================================================

#[test]
fn given_item_below_destination_row_when_moved_up_then_lands_at_row() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);

    let moved = model.move_items(0, &root(), &[at(&model, &[2])]);

    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].row(), 0);
    assert_eq!(
        texts(&model, &root()),
        ["Genesis 1:1 (KJV)", "Psalms", "Gospels"]
    );
}

#[test]
fn given_item_above_destination_row_when_moved_down_then_row_accounts_for_its_removal() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);

    let moved = model.move_items(3, &root(), &[at(&model, &[0])]);

    assert_eq!(moved[0].row(), 2);
    assert_eq!(
        texts(&model, &root()),
        ["Gospels", "Genesis 1:1 (KJV)", "Psalms"]
    );
}

#[test]
fn given_folder_when_moved_into_sibling_then_subtree_travels_along() {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);
    let gospels = at(&model, &[1]);

    let moved = model.move_items(0, &gospels, &[at(&model, &[0])]);

    assert_eq!(moved.len(), 1);
    assert_eq!(texts(&model, &root()), ["Gospels", "Genesis 1:1 (KJV)"]);
    let psalms = at(&model, &[0, 0]);
    assert_eq!(psalms, moved[0]);
    assert_eq!(texts(&model, &psalms), ["Shepherd", "Praise"]);
    assert!(model.store().save_pending());
}

// ============================================================
// Sort
// ============================================================

#[test]
fn given_root_when_sorted_ascending_then_every_folder_is_sorted_independently() {
    let dir = TempDir::new().unwrap();
    let mut model = default_library(&dir);

    let changes = model.sort_items(&root(), SortOrder::Ascending);

    assert_eq!(
        texts(&model, &root()),
        ["Genesis 1:1 (KJV)", "Gospels", "Psalms"]
    );
    let psalms = at(&model, &[2]);
    assert_eq!(texts(&model, &psalms), ["Praise", "Shepherd"]);

    assert_eq!(changes.len(), 4);
    assert_eq!(
        changes[0],
        LayoutChange {
            parent: root(),
            moves: vec![(2, 0), (0, 2)],
        }
    );
    assert_eq!(
        changes[1],
        LayoutChange {
            parent: psalms,
            moves: vec![(1, 0), (0, 1)],
        }
    );
    assert!(model.store().save_pending());
}

#[test]
fn given_root_when_sorted_descending_then_order_is_reversed() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);

    model.sort_items(&root(), SortOrder::Descending);

    assert_eq!(
        texts(&model, &root()),
        ["Psalms", "Gospels", "Genesis 1:1 (KJV)"]
    );
    assert_eq!(texts(&model, &at(&model, &[0])), ["Shepherd", "Praise"]);
}

#[test]
fn given_sub_folder_when_sorted_then_only_that_folder_changes() {
    let dir = TempDir::new().unwrap();
    let mut model = library(&dir);
    let gospels = at(&model, &[1]);
    for name in ["Mark", "Matthew", "John", "Luke"] {
        model.add_folder(model.row_count(&gospels), &gospels, name).unwrap();
    }

    let changes = model.sort_items(&gospels, SortOrder::Ascending);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].parent, gospels);
    assert_eq!(
        texts(&model, &gospels),
        ["John", "Luke", "Mark", "Matthew"]
    );
    assert_eq!(
        texts(&model, &root()),
        ["Psalms", "Gospels", "Genesis 1:1 (KJV)"]
    );
}
