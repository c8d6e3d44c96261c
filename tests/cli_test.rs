//! Integration tests for the `btbm` command line: argument parsing and
//! commands run against an explicit bookmark file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use tempfile::TempDir;

use btbookmarks::cli::args::{Cli, Commands};
use btbookmarks::cli::commands::parse_row_path;
use btbookmarks::cli::execute_command;
use btbookmarks::domain::{codec, BookmarkData, Fragment};
use btbookmarks::util::testing::init_test_setup;

const CONFIG: &str = r#"
[[modules]]
name = "KJV"
type = "bible"
description = "King James Version"
"#;

struct Workspace {
    _dir: TempDir,
    config: PathBuf,
    file: PathBuf,
}

fn workspace() -> Workspace {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("btbookmarks.toml");
    fs::write(&config, CONFIG).unwrap();
    let file = dir.path().join("bookmarks.xml");
    Workspace {
        config,
        file,
        _dir: dir,
    }
}

fn run(ws: &Workspace, args: &[&str]) -> btbookmarks::cli::CliResult<()> {
    let mut argv = vec![
        "btbm".to_string(),
        "--config".to_string(),
        ws.config.display().to_string(),
        "--file".to_string(),
        ws.file.display().to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    execute_command(&Cli::try_parse_from(argv).expect("parse args"))
}

fn items(path: &Path) -> Vec<Fragment> {
    codec::decode(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn verify_cli() {
    Cli::command().debug_assert();
}

#[test]
fn given_negative_row_when_parsing_add_bookmark_then_it_is_accepted() {
    let cli = Cli::try_parse_from(["btbm", "add-bookmark", "KJV", "John 3:16", "--row", "-2"])
        .unwrap();

    match cli.command {
        Some(Commands::AddBookmark { row, .. }) => assert_eq!(row, -2),
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn given_row_paths_when_parsed_then_segments_become_rows() {
    assert_eq!(parse_row_path("1/0").unwrap(), vec![1, 0]);
    assert!(parse_row_path("-1").is_err());
}

#[test]
fn given_fresh_file_when_adding_folder_and_bookmark_then_file_contains_both() {
    let ws = workspace();

    run(&ws, &["add-folder", "Favorites"]).unwrap();
    run(
        &ws,
        &[
            "add-bookmark",
            "KJV",
            "John 3:16",
            "--parent",
            "0",
            "--title",
            "Key Verse",
        ],
    )
    .unwrap();

    assert_eq!(
        items(&ws.file),
        vec![Fragment::folder(
            "Favorites",
            vec![Fragment::bookmark(
                BookmarkData::new("KJV", "John 3:16", ""),
                "Key Verse"
            )]
        )]
    );
    let saved = fs::read_to_string(&ws.file).unwrap();
    assert!(saved.contains(r#"moduledescription="King James Version""#));
}

#[test]
fn given_bookmarks_when_rename_describe_copy_and_sort_then_file_reflects_each_step() {
    let ws = workspace();
    run(&ws, &["add-folder", "Zeta"]).unwrap();
    run(&ws, &["add-bookmark", "KJV", "Genesis 1:1"]).unwrap();

    run(&ws, &["rename", "0", "Alpha"]).unwrap();
    run(&ws, &["describe", "1", "beginning"]).unwrap();
    run(&ws, &["copy", "1", "--to", "0"]).unwrap();
    run(&ws, &["sort", "--descending"]).unwrap();

    assert_eq!(
        items(&ws.file),
        vec![
            Fragment::bookmark(BookmarkData::new("KJV", "Genesis 1:1", "beginning"), ""),
            Fragment::folder(
                "Alpha",
                vec![Fragment::bookmark(
                    BookmarkData::new("KJV", "Genesis 1:1", "beginning"),
                    ""
                )]
            ),
        ]
    );
}

#[test]
fn given_folder_when_moved_into_itself_then_command_fails_and_file_is_untouched() {
    let ws = workspace();
    run(&ws, &["add-folder", "Outer"]).unwrap();
    run(&ws, &["add-folder", "Inner", "--parent", "0"]).unwrap();
    let before = fs::read_to_string(&ws.file).unwrap();

    let err = run(&ws, &["move", "0", "--to", "0/0"]).unwrap_err();

    assert_eq!(err.exit_code(), btbookmarks::exitcode::USAGE);
    assert_eq!(fs::read_to_string(&ws.file).unwrap(), before);
}

#[test]
fn given_items_when_removed_then_they_are_gone_from_file() {
    let ws = workspace();
    for name in ["a", "b", "c"] {
        run(&ws, &["add-folder", name]).unwrap();
    }

    run(&ws, &["remove", "0", "-n", "2"]).unwrap();

    assert_eq!(items(&ws.file), vec![Fragment::folder("c", Vec::new())]);
    assert!(run(&ws, &["remove", "5"]).is_err());
}

#[test]
fn given_other_file_when_imported_and_exported_then_items_travel_both_ways() {
    let ws = workspace();
    let other = ws.file.with_file_name("other.xml");
    fs::write(
        &other,
        r#"<SwordBookmarks syntaxVersion="1"><Bookmark key="Psalms 23:1" modulename="KJV"/></SwordBookmarks>"#,
    )
    .unwrap();
    run(&ws, &["add-folder", "Imported"]).unwrap();

    run(&ws, &["import", other.to_str().unwrap(), "--into", "0"]).unwrap();
    let exported = ws.file.with_file_name("exported.xml");
    run(&ws, &["export", exported.to_str().unwrap(), "--item", "0"]).unwrap();

    assert_eq!(
        items(&exported),
        vec![Fragment::bookmark(
            BookmarkData::new("KJV", "Psalms 23:1", ""),
            ""
        )]
    );
    assert_eq!(items(&ws.file)[0].children().len(), 1);
}

#[test]
fn given_missing_import_source_when_imported_then_noinput_exit_code() {
    let ws = workspace();

    let err = run(&ws, &["import", "/definitely/not/here.xml"]).unwrap_err();

    assert_eq!(err.exit_code(), btbookmarks::exitcode::NOINPUT);
}

#[test]
fn given_tree_command_when_file_absent_then_succeeds_without_creating_it() {
    let ws = workspace();

    run(&ws, &["tree"]).unwrap();

    assert!(!ws.file.exists());
}

#[test]
fn given_file_emptied_by_remove_when_reopened_then_new_items_can_be_added() {
    let ws = workspace();
    run(&ws, &["add-folder", "A"]).unwrap();
    run(&ws, &["remove", "0"]).unwrap();
    assert!(items(&ws.file).is_empty());

    run(&ws, &["add-folder", "B"]).unwrap();
    run(&ws, &["tree"]).unwrap();

    assert_eq!(items(&ws.file), vec![Fragment::folder("B", Vec::new())]);
}
