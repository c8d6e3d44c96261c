//! Command dispatch for `btbm`

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use itertools::Itertools;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::{BookmarksModel, ModelIndex};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{ModuleInfo, ModuleType, SortOrder};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    // Commands that need no bookmark store
    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        Commands::Config { command } => {
            let settings = Settings::load(cli.config.as_deref())?;
            return cmd_config(command, &settings);
        }
        _ => {}
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);
    let mut model = open_model(&container, cli.file.as_deref())?;

    let changed = match command {
        Commands::Tree { path } => cmd_tree(&model, path, cli.file.as_deref()).map(|_| false)?,
        Commands::AddFolder { name, parent, row } => {
            cmd_add_folder(&mut model, name, parent, *row)?
        }
        Commands::AddBookmark {
            module,
            key,
            description,
            title,
            parent,
            row,
        } => cmd_add_bookmark(&mut model, module, key, description, title, parent, *row)?,
        Commands::Rename { path, text } => {
            let index = resolve_path(&model, path)?;
            if !model.set_text(&index, text) {
                return Err(CliError::InvalidArgs(format!("cannot rename '{}'", path)));
            }
            output::action("Renamed", path);
            true
        }
        Commands::Describe { path, description } => {
            let index = resolve_path(&model, path)?;
            if !model.set_description(&index, description) {
                return Err(CliError::InvalidArgs(format!("'{}' is not a bookmark", path)));
            }
            output::action("Described", path);
            true
        }
        Commands::Remove { path, count } => cmd_remove(&mut model, path, *count)?,
        Commands::Copy { items, to, row } => cmd_transfer(&mut model, items, to, *row, false)?,
        Commands::Move { items, to, row } => cmd_transfer(&mut model, items, to, *row, true)?,
        Commands::Sort { path, descending } => cmd_sort(&mut model, path, *descending)?,
        Commands::Import { source, into } => cmd_import(&mut model, source, into)?,
        Commands::Export { destination, item } => cmd_export(&mut model, destination, item)?,
        Commands::Config { .. } | Commands::Completion { .. } => false,
    };

    if changed {
        save(&mut model, cli.file.as_deref())?;
    }
    Ok(())
}

/// Work on `file` if given (an absent file starts empty), otherwise on the
/// default store.
fn open_model(container: &ServiceContainer, file: Option<&Path>) -> CliResult<BookmarksModel> {
    match file {
        Some(path) if container.fs.exists(path) => Ok(container.open_model_from(path)?),
        Some(path) => {
            debug!("{} does not exist yet, starting empty", path.display());
            Ok(container.open_model())
        }
        None => Ok(container.open_default_model()?),
    }
}

fn save(model: &mut BookmarksModel, file: Option<&Path>) -> CliResult<()> {
    let path = model.store_mut().try_save(file, None)?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Parse a row path like `0/2/1`. Empty segments are ignored, so `""` and
/// `"/"` both name the root.
pub fn parse_row_path(path: &str) -> CliResult<Vec<usize>> {
    path.split('/')
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            segment
                .trim()
                .parse::<usize>()
                .map_err(|_| CliError::InvalidArgs(format!("invalid row '{}' in '{}'", segment, path)))
        })
        .collect()
}

pub fn resolve_path(model: &BookmarksModel, path: &str) -> CliResult<ModelIndex> {
    let mut index = ModelIndex::invalid();
    for row in parse_row_path(path)? {
        let child = model.index(row, 0, &index);
        if !child.is_valid() {
            return Err(CliError::InvalidArgs(format!("no item at '{}'", path)));
        }
        index = child;
    }
    Ok(index)
}

fn resolve_folder(model: &BookmarksModel, path: &str) -> CliResult<ModelIndex> {
    let index = resolve_path(model, path)?;
    if index.is_valid() && !model.is_folder(&index) {
        return Err(CliError::InvalidArgs(format!("'{}' is not a folder", path)));
    }
    Ok(index)
}

/// Row path of an index, the inverse of [`resolve_path`].
fn row_path(model: &BookmarksModel, index: &ModelIndex) -> String {
    let mut rows = Vec::new();
    let mut current = *index;
    while current.is_valid() {
        rows.push(current.row());
        current = model.parent(&current);
    }
    rows.iter().rev().join("/")
}

fn build_tree(model: &BookmarksModel, index: &ModelIndex, label: String) -> Tree<String> {
    let mut tree = Tree::new(label);
    for row in 0..model.row_count(index) {
        let child = model.index(row, 0, index);
        let Some(attributes) = model.attributes(&child) else {
            continue;
        };
        let label = if model.is_folder(&child) {
            format!("[{}] {}", row, attributes.text.blue().bold())
        } else if model.is_bookmark(&child) {
            let description = model.description(&child);
            if description.is_empty() {
                format!("[{}] {}", row, attributes.text)
            } else {
                format!("[{}] {} {}", row, attributes.text, description.dimmed())
            }
        } else {
            format!("[{}] {}", row, "(untyped)".dimmed())
        };
        tree.push(build_tree(model, &child, label));
    }
    tree
}

#[instrument(level = "debug", skip(model))]
fn cmd_tree(model: &BookmarksModel, path: &str, file: Option<&Path>) -> CliResult<()> {
    let index = resolve_path(model, path)?;
    let label = match model.attributes(&index) {
        Some(attributes) => attributes.text,
        None => file
            .unwrap_or_else(|| model.store().default_file())
            .display()
            .to_string(),
    };
    output::info(&build_tree(model, &index, label.cyan().bold().to_string()));
    Ok(())
}

fn cmd_add_folder(
    model: &mut BookmarksModel,
    name: &str,
    parent: &str,
    row: Option<usize>,
) -> CliResult<bool> {
    let parent_index = resolve_folder(model, parent)?;
    let row = row.unwrap_or_else(|| model.row_count(&parent_index));
    let index = model
        .add_folder(row, &parent_index, name)
        .ok_or_else(|| CliError::InvalidArgs(format!("cannot add folder at row {}", row)))?;
    output::action("Added folder", &row_path(model, &index));
    Ok(true)
}

fn cmd_add_bookmark(
    model: &mut BookmarksModel,
    module: &str,
    key: &str,
    description: &str,
    title: &str,
    parent: &str,
    row: isize,
) -> CliResult<bool> {
    let parent_index = resolve_folder(model, parent)?;
    let module_info = match model.store().find_module(module) {
        Some(info) => info,
        None => {
            output::warning(&format!("module '{}' is not installed", module));
            ModuleInfo::new(module, ModuleType::Other)
        }
    };
    let index = model
        .add_bookmark(row, &parent_index, &module_info, key, description, title)
        .ok_or_else(|| CliError::InvalidArgs(format!("cannot add bookmark at row {}", row)))?;
    output::action("Added bookmark", &row_path(model, &index));
    Ok(true)
}

fn cmd_remove(model: &mut BookmarksModel, path: &str, count: usize) -> CliResult<bool> {
    let index = resolve_path(model, path)?;
    if !index.is_valid() {
        return Err(CliError::InvalidArgs("the root cannot be removed".into()));
    }
    let parent = model.parent(&index);
    if !model.remove_rows(index.row(), count, &parent) {
        return Err(CliError::InvalidArgs(format!(
            "cannot remove {} row(s) at '{}'",
            count, path
        )));
    }
    output::action("Removed", &format!("{} item(s) at {}", count, path));
    Ok(true)
}

fn cmd_transfer(
    model: &mut BookmarksModel,
    items: &[String],
    to: &str,
    row: Option<usize>,
    relocate: bool,
) -> CliResult<bool> {
    let sources = items
        .iter()
        .map(|item| resolve_path(model, item))
        .collect::<CliResult<Vec<_>>>()?;
    let dest = resolve_folder(model, to)?;
    let row = row.unwrap_or_else(|| model.row_count(&dest));

    let placed = if relocate {
        model.move_items(row, &dest, &sources)
    } else {
        model.copy_items(row, &dest, &sources)
    };
    if placed.is_empty() {
        return Err(CliError::InvalidArgs(
            "selection rejected: a folder must be alone and cannot go into its own subtree"
                .into(),
        ));
    }

    let label = if relocate { "Moved" } else { "Copied" };
    for index in &placed {
        output::action(label, &row_path(model, index));
    }
    Ok(true)
}

fn cmd_sort(model: &mut BookmarksModel, path: &str, descending: bool) -> CliResult<bool> {
    let index = resolve_folder(model, path)?;
    let order = if descending {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    let changes = model.sort_items(&index, order);
    let moved: usize = changes.iter().map(|change| change.moves.len()).sum();
    output::action(
        "Sorted",
        &format!("{} folder(s), {} item(s) moved", changes.len(), moved),
    );
    Ok(!changes.is_empty())
}

fn cmd_import(model: &mut BookmarksModel, source: &Path, into: &str) -> CliResult<bool> {
    let target = resolve_folder(model, into)?;
    let target_id = model.resolve(&target);
    let ids = model.store_mut().try_load(Some(source), target_id)?;
    output::action(
        "Imported",
        &format!("{} item(s) from {}", ids.len(), source.display()),
    );
    Ok(true)
}

fn cmd_export(model: &mut BookmarksModel, destination: &Path, item: &str) -> CliResult<bool> {
    let subtree = resolve_folder(model, item)?;
    let subtree_id = model.resolve(&subtree);
    let path = model.store_mut().try_save(Some(destination), subtree_id)?;
    output::action("Exported", &path.display());
    Ok(false)
}

fn cmd_config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global config", &path.display()),
                None => output::warning("no config directory on this platform"),
            }
            output::action("bookmarks", &settings.bookmarks_path().display());
        }
    }
    Ok(())
}
