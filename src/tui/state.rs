use crate::model::{AppEvent, OutputFile};
use crate::view::{Affordance, ViewNode};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use reqwest::Url;
use std::collections::VecDeque;
use std::path::PathBuf;

pub const TAB_FILES: usize = 0;
pub const TAB_UPLOAD: usize = 1;
pub const TAB_HELP: usize = 2;

/// A file staged for the next upload. Only the size is read up front; the contents are
/// read when the upload is submitted.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

pub struct UiState {
    pub tab: usize,
    pub info: String,
    pub base_url: Url,
    pub log_path: Option<PathBuf>,

    // Files tab
    pub list_view: ViewNode,
    pub files: Vec<OutputFile>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub last_refresh: Option<String>,

    // Upload tab
    pub staged: Vec<StagedFile>,
    pub generate_excel: bool,
    pub generate_ppt: bool,
    pub submit_enabled: bool,
    pub processing: bool,
    pub last_messages: Vec<String>,
    pub path_input: String,
    pub path_editing: bool,

    // Blocking notifications: the head is shown until dismissed.
    pub alerts: VecDeque<String>,
}

impl UiState {
    pub fn new(base_url: Url) -> Self {
        Self {
            tab: TAB_FILES,
            info: "Loading output files…".into(),
            base_url,
            log_path: None,
            list_view: ViewNode::List(Vec::new()),
            files: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            last_refresh: None,
            staged: Vec::new(),
            generate_excel: true,
            generate_ppt: true,
            submit_enabled: true,
            processing: false,
            last_messages: Vec::new(),
            path_input: String::new(),
            path_editing: false,
            alerts: VecDeque::new(),
        }
    }

    pub fn active_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    /// Rendered items of the current listing (empty when showing a placeholder or notice).
    pub fn items(&self) -> &[ViewNode] {
        match &self.list_view {
            ViewNode::List(items) => items,
            _ => &[],
        }
    }

    /// Label and actions of the selected item, if any.
    pub fn selected_item(&self) -> Option<(&str, &[Affordance])> {
        match self.items().get(self.selected)? {
            ViewNode::Item { label, actions, .. } => Some((label.as_str(), actions.as_slice())),
            _ => None,
        }
    }

    pub fn selected_delete_key(&self) -> Option<&str> {
        let (_, actions) = self.selected_item()?;
        actions.iter().find_map(|a| match a {
            Affordance::Delete { key } => Some(key.as_str()),
            _ => None,
        })
    }

    pub fn selected_download_url(&self) -> Option<Url> {
        let (_, actions) = self.selected_item()?;
        let href = actions.iter().find_map(|a| match a {
            Affordance::Download { href } => Some(href.as_str()),
            _ => None,
        })?;
        self.base_url.join(href).ok()
    }

    pub fn move_selection(&mut self, down: bool, visible_rows: usize) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        if down {
            if self.selected + 1 < len {
                self.selected += 1;
            }
        } else {
            self.selected = self.selected.saturating_sub(1);
        }
        self.clamp_scroll(visible_rows.max(1));
    }

    fn clamp_scroll(&mut self, visible_rows: usize) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_rows {
            self.scroll_offset = self.selected + 1 - visible_rows;
        }
    }

    pub fn stage(&mut self, path: PathBuf) {
        let size = match std::fs::metadata(&path) {
            Ok(m) if m.is_file() => m.len(),
            Ok(_) => {
                self.alerts
                    .push_back(format!("Not a regular file: {}", path.display()));
                return;
            }
            Err(e) => {
                self.alerts
                    .push_back(format!("Cannot stage {}: {e}", path.display()));
                return;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.info = format!("Staged {name}");
        self.staged.push(StagedFile { path, name, size });
    }
}

/// Apply a controller event to the UI state.
pub fn apply_event(state: &mut UiState, ev: AppEvent) {
    match ev {
        AppEvent::ListRendered(node) => {
            state.list_view = node;
            let len = state.items().len();
            if state.selected >= len {
                state.selected = len.saturating_sub(1);
            }
            if state.scroll_offset > state.selected {
                state.scroll_offset = state.selected;
            }
        }
        AppEvent::FilesChanged(files) => {
            state.info = format!("Refreshed: {} file(s)", files.len());
            state.files = files;
            state.last_refresh = Some(now_hms());
        }
        AppEvent::Alert(msg) => state.alerts.push_back(msg),
        AppEvent::SubmitControl { enabled } => state.submit_enabled = enabled,
        AppEvent::Processing { visible } => {
            state.processing = visible;
            if visible {
                state.info = "Processing upload…".into();
            }
        }
        AppEvent::UploadCompleted(result) => {
            state.info = format!("Upload complete: {} file(s) generated", result.files.len());
            state.last_messages = result.messages;
            state.staged.clear();
        }
        AppEvent::Info(msg) => state.info = msg,
    }
}

fn now_hms() -> String {
    let fmt = time::macros::format_description!("[hour]:[minute]:[second]");
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .format(&fmt)
        .unwrap_or_else(|_| "now".into())
}

/// Append `label: value` to the status panel. Long values (server URLs, log paths)
/// continue on indented lines instead of being clipped by the panel border.
pub fn push_status_field(out: &mut Vec<Line<'static>>, label: &str, value: &str, panel_width: u16) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    let head = format!("{label}:");
    // Border plus padding on both sides.
    let inner = usize::from(panel_width.saturating_sub(4)).max(1);
    let first_width = inner.saturating_sub(head.chars().count() + 1).max(1);
    let rest_width = inner.saturating_sub(2).max(1);

    let chars: Vec<char> = value.chars().collect();
    let (first, rest) = chars.split_at(first_width.min(chars.len()));
    out.push(Line::from(vec![
        Span::styled(head, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::raw(first.iter().collect::<String>()),
    ]));
    for chunk in rest.chunks(rest_width) {
        out.push(Line::from(vec![
            Span::raw("  "),
            Span::raw(chunk.iter().collect::<String>()),
        ]));
    }
}
