//! Declarative view builders.
//!
//! Everything here is pure: model values in, a `ViewNode` tree out. Presentation layers
//! (TUI, text printer) decide how to draw the tree and how to wire its affordances.

use crate::format::format_file_size;
use crate::model::{FileKind, OutputFile, UploadResult};

pub const NO_FILES_PLACEHOLDER: &str = "No output files yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Spreadsheet,
    Slides,
    Document,
    Transcript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// An action attached to a rendered item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affordance {
    /// Fetch the artifact from `href` (the registry's opaque path).
    Download { href: String },
    /// Delete the artifact registered under `key`.
    Delete { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    List(Vec<ViewNode>),
    Item {
        icon: Icon,
        label: String,
        detail: Option<String>,
        actions: Vec<Affordance>,
    },
    Placeholder(String),
    Notice { level: NoticeLevel, text: String },
    Text(String),
}

impl ViewNode {
    /// Number of `Item` nodes in this tree.
    pub fn item_count(&self) -> usize {
        match self {
            ViewNode::List(children) => children.iter().map(ViewNode::item_count).sum(),
            ViewNode::Item { .. } => 1,
            _ => 0,
        }
    }

    /// Flatten the tree into plain text lines (used by the non-interactive printer).
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.push_lines(&mut out);
        out
    }

    fn push_lines(&self, out: &mut Vec<String>) {
        match self {
            ViewNode::List(children) => {
                for c in children {
                    c.push_lines(out);
                }
            }
            ViewNode::Item {
                icon,
                label,
                detail,
                actions,
            } => {
                let mut line = format!("{} {}", icon_tag(*icon), label);
                if let Some(d) = detail {
                    line.push_str(&format!(" ({d})"));
                }
                for a in actions {
                    if let Affordance::Download { href } = a {
                        line.push_str(&format!("  {href}"));
                    }
                }
                out.push(line);
            }
            ViewNode::Placeholder(text) | ViewNode::Text(text) => out.push(text.clone()),
            ViewNode::Notice { level, text } => match level {
                NoticeLevel::Info => out.push(text.clone()),
                NoticeLevel::Error => out.push(format!("error: {text}")),
            },
        }
    }
}

pub fn icon_tag(icon: Icon) -> &'static str {
    match icon {
        Icon::Spreadsheet => "[xls]",
        Icon::Slides => "[ppt]",
        Icon::Document => "[doc]",
        Icon::Transcript => "[json]",
    }
}

fn icon_for(kind: FileKind) -> Icon {
    match kind {
        FileKind::Excel => Icon::Spreadsheet,
        FileKind::Ppt => Icon::Slides,
        FileKind::Other => Icon::Document,
    }
}

pub fn render_file_item(file: &OutputFile) -> ViewNode {
    ViewNode::Item {
        icon: icon_for(file.kind),
        label: file.name.clone(),
        detail: None,
        actions: vec![
            Affordance::Download {
                href: file.path.clone(),
            },
            Affordance::Delete {
                key: file.name.clone(),
            },
        ],
    }
}

/// Render the registry listing in server order, or the placeholder when it is empty.
pub fn render_file_list(files: &[OutputFile]) -> ViewNode {
    if files.is_empty() {
        return ViewNode::Placeholder(NO_FILES_PLACEHOLDER.to_string());
    }
    ViewNode::List(files.iter().map(render_file_item).collect())
}

pub fn render_error_notice(message: &str) -> ViewNode {
    ViewNode::Notice {
        level: NoticeLevel::Error,
        text: message.to_string(),
    }
}

pub fn render_upload_result(result: &UploadResult) -> ViewNode {
    let mut nodes = Vec::with_capacity(result.messages.len() + 1);
    if let Some(status) = result.status.as_deref() {
        nodes.push(ViewNode::Notice {
            level: NoticeLevel::Info,
            text: format!("Status: {status}"),
        });
    }
    nodes.extend(result.messages.iter().map(|m| ViewNode::Text(m.clone())));
    ViewNode::List(nodes)
}

/// Selected files (name, byte size) with their human-readable sizes.
pub fn render_selection<'a>(files: impl IntoIterator<Item = (&'a str, u64)>) -> ViewNode {
    let items: Vec<ViewNode> = files
        .into_iter()
        .map(|(name, size)| ViewNode::Item {
            icon: Icon::Transcript,
            label: name.to_string(),
            detail: Some(format_file_size(size)),
            actions: Vec::new(),
        })
        .collect();
    if items.is_empty() {
        return ViewNode::Placeholder("No files selected".to_string());
    }
    ViewNode::List(items)
}
