//! XML codec for bookmark documents
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <SwordBookmarks syntaxVersion="1">
//!  <Folder caption="Favorites">
//!   <Bookmark key="John 3:16" description="" modulename="KJV" moduledescription="King James Version" title="Key Verse"/>
//!  </Folder>
//! </SwordBookmarks>
//! ```
//!
//! `moduledescription` is written from the live module registry for the
//! benefit of other readers and is ignored on load.

use std::fmt::Display;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, warn};

use crate::domain::arena::{BookmarkArena, NodeId};
use crate::domain::entities::{BookmarkData, NodeKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::fragment::Fragment;

pub const ROOT_TAG: &str = "SwordBookmarks";
pub const SYNTAX_VERSION: u32 = 1;

const FOLDER_TAG: &str = "Folder";
const BOOKMARK_TAG: &str = "Bookmark";

enum Tag {
    Folder,
    Bookmark,
    Unknown,
}

fn classify(name: &[u8]) -> Tag {
    if name == FOLDER_TAG.as_bytes() {
        Tag::Folder
    } else if name == BOOKMARK_TAG.as_bytes() {
        Tag::Bookmark
    } else {
        Tag::Unknown
    }
}

fn xml_err(err: impl Display) -> DomainError {
    DomainError::Xml(err.to_string())
}

fn attribute(element: &BytesStart<'_>, name: &str) -> DomainResult<Option<String>> {
    match element.try_get_attribute(name).map_err(xml_err)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_err)?.into_owned())),
        None => Ok(None),
    }
}

fn check_root(element: &BytesStart<'_>) -> DomainResult<()> {
    let name = element.name();
    if name.as_ref() != ROOT_TAG.as_bytes() {
        return Err(DomainError::UnexpectedRoot(
            String::from_utf8_lossy(name.as_ref()).into_owned(),
        ));
    }
    if let Some(version) = attribute(element, "syntaxVersion")? {
        match version.trim().parse::<u32>() {
            Ok(v) if v <= SYNTAX_VERSION => {}
            _ => warn!("unsupported bookmark syntaxVersion {:?}, reading as {}", version, SYNTAX_VERSION),
        }
    }
    Ok(())
}

fn decode_bookmark(element: &BytesStart<'_>) -> DomainResult<Fragment> {
    let data = BookmarkData {
        key: attribute(element, "key")?.unwrap_or_default(),
        description: attribute(element, "description")?.unwrap_or_default(),
        module_name: attribute(element, "modulename")?.unwrap_or_default(),
    };
    let title = attribute(element, "title")?.unwrap_or_default();
    Ok(Fragment::bookmark(data, title))
}

fn container<'a>(
    top_level: &'a mut Vec<Fragment>,
    open_folders: &'a mut [(String, Vec<Fragment>)],
) -> &'a mut Vec<Fragment> {
    match open_folders.last_mut() {
        Some((_, children)) => children,
        None => top_level,
    }
}

/// Parse a bookmark document into its top-level items.
///
/// Elements other than `Folder` and `Bookmark` are skipped together with
/// their content. Missing attributes default to empty strings.
pub fn decode(xml: &str) -> DomainResult<Vec<Fragment>> {
    if xml.trim().is_empty() {
        return Err(DomainError::EmptyDocument);
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut top_level = Vec::new();
    let mut open_folders: Vec<(String, Vec<Fragment>)> = Vec::new();
    let mut in_root = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if !in_root => {
                check_root(&e)?;
                in_root = true;
            }
            Event::Empty(e) if !in_root => {
                check_root(&e)?;
                return Ok(Vec::new());
            }
            Event::Start(e) => match classify(e.name().as_ref()) {
                Tag::Folder => {
                    let caption = attribute(&e, "caption")?.unwrap_or_default();
                    open_folders.push((caption, Vec::new()));
                }
                Tag::Bookmark => {
                    let bookmark = decode_bookmark(&e)?;
                    container(&mut top_level, &mut open_folders).push(bookmark);
                    reader.read_to_end(e.name()).map_err(xml_err)?;
                }
                Tag::Unknown => {
                    debug!("skipping <{}>", String::from_utf8_lossy(e.name().as_ref()));
                    reader.read_to_end(e.name()).map_err(xml_err)?;
                }
            },
            Event::Empty(e) => match classify(e.name().as_ref()) {
                Tag::Folder => {
                    let caption = attribute(&e, "caption")?.unwrap_or_default();
                    container(&mut top_level, &mut open_folders)
                        .push(Fragment::folder(caption, Vec::new()));
                }
                Tag::Bookmark => {
                    let bookmark = decode_bookmark(&e)?;
                    container(&mut top_level, &mut open_folders).push(bookmark);
                }
                Tag::Unknown => {
                    debug!("skipping <{}/>", String::from_utf8_lossy(e.name().as_ref()));
                }
            },
            Event::End(_) => match open_folders.pop() {
                Some((caption, children)) => {
                    container(&mut top_level, &mut open_folders)
                        .push(Fragment::folder(caption, children));
                }
                // closing tag of the root element
                None => return Ok(top_level),
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if in_root {
        Err(DomainError::Xml(format!("unterminated <{}> element", ROOT_TAG)))
    } else {
        Err(DomainError::EmptyDocument)
    }
}

/// Serialize the children of `subtree` into a bookmark document.
///
/// `module_description` maps a module name to the description written as
/// `moduledescription`; it returns an empty string for unknown modules.
pub fn encode<F>(tree: &BookmarkArena, subtree: NodeId, module_description: F) -> DomainResult<String>
where
    F: Fn(&str) -> String,
{
    let node = tree.node(subtree)?;
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new(ROOT_TAG);
    root.push_attribute(("syntaxVersion", SYNTAX_VERSION.to_string().as_str()));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for &child in node.children() {
        write_item(&mut writer, tree, child, &module_description)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_TAG)))
        .map_err(xml_err)?;

    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn write_item<F>(
    writer: &mut Writer<Vec<u8>>,
    tree: &BookmarkArena,
    id: NodeId,
    module_description: &F,
) -> DomainResult<()>
where
    F: Fn(&str) -> String,
{
    let node = tree.node(id)?;
    match &node.kind {
        NodeKind::Folder => {
            let mut element = BytesStart::new(FOLDER_TAG);
            element.push_attribute(("caption", node.text.as_str()));

            if node.children().is_empty() {
                writer.write_event(Event::Empty(element)).map_err(xml_err)?;
            } else {
                writer.write_event(Event::Start(element)).map_err(xml_err)?;
                for &child in node.children() {
                    write_item(writer, tree, child, module_description)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(FOLDER_TAG)))
                    .map_err(xml_err)?;
            }
        }
        NodeKind::Bookmark(data) => {
            let description = module_description(&data.module_name);
            let mut element = BytesStart::new(BOOKMARK_TAG);
            element.push_attribute(("key", data.key.as_str()));
            element.push_attribute(("description", data.description.as_str()));
            element.push_attribute(("modulename", data.module_name.as_str()));
            element.push_attribute(("moduledescription", description.as_str()));
            if !node.text.is_empty() {
                element.push_attribute(("title", node.text.as_str()));
            }
            writer.write_event(Event::Empty(element)).map_err(xml_err)?;
        }
        // untyped rows have no persistent form
        NodeKind::Placeholder => {}
    }
    Ok(())
}
