mod clipboard;
mod help;
mod list;
mod state;

use crate::cli::{build_config, Cli};
use crate::engine::ApiClient;
use crate::model::AppEvent;
use crate::orchestrator::{self, FileListController, UiCommand};
use anyhow::{Context, Result};
use clipboard::copy_to_clipboard;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use state::{apply_event, push_status_field, UiState, TAB_FILES, TAB_HELP, TAB_UPLOAD};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let log_path = crate::telemetry::init_file("warn").ok();
    let cfg = build_config(&args)?;
    let client = ApiClient::new(&cfg).context("build HTTP client")?;

    // Unbounded channels keep the controller from ever waiting on the UI thread.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let ctrl = Arc::new(FileListController::new(
        client,
        cfg.required_extension.clone(),
        event_tx.clone(),
    ));

    let mut state = UiState::new(cfg.base_url.clone());
    state.log_path = log_path;
    for p in &args.stage {
        state.stage(p.clone());
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(state, event_rx, cmd_tx));

    let res =
        orchestrator::run_controller(ctrl, event_tx, cfg.download_dir.clone(), cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut list_rows = 20usize;

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal
                .draw(|f| {
                    list_rows = draw(f.area(), f, &state);
                })
                .ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
                if state.active_alert().is_some() {
                    state.dismiss_alert();
                    continue;
                }
                if state.path_editing {
                    handle_path_input(&mut state, k.code);
                    continue;
                }
                if handle_key(&mut state, k.code, list_rows, &cmd_tx) {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_path_input(state: &mut UiState, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            let input = state.path_input.trim().to_string();
            state.path_editing = false;
            state.path_input.clear();
            if !input.is_empty() {
                state.stage(input.into());
            }
        }
        KeyCode::Esc => {
            state.path_editing = false;
            state.path_input.clear();
        }
        KeyCode::Backspace => {
            state.path_input.pop();
        }
        KeyCode::Char(c) => state.path_input.push(c),
        _ => {}
    }
}

/// Handle a key press outside of modal states. Returns true when the user quits.
fn handle_key(
    state: &mut UiState,
    code: KeyCode,
    list_rows: usize,
    cmd_tx: &UnboundedSender<UiCommand>,
) -> bool {
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => state.tab = (state.tab + 1) % 3,
        KeyCode::Char('?') => state.tab = TAB_HELP,
        _ if state.tab == TAB_FILES => handle_files_key(state, code, list_rows, cmd_tx),
        _ if state.tab == TAB_UPLOAD => handle_upload_key(state, code, cmd_tx),
        _ => {}
    }
    false
}

fn handle_files_key(
    state: &mut UiState,
    code: KeyCode,
    list_rows: usize,
    cmd_tx: &UnboundedSender<UiCommand>,
) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(false, list_rows),
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(true, list_rows),
        KeyCode::Char('r') => {
            state.info = "Refreshing…".into();
            let _ = cmd_tx.send(UiCommand::Refresh);
        }
        KeyCode::Char('d') => {
            if let Some(key) = state.selected_delete_key().map(str::to_string) {
                state.info = format!("Deleting {key}…");
                let _ = cmd_tx.send(UiCommand::Delete(key));
            }
        }
        KeyCode::Char('s') => {
            if let Some(name) = state.selected_item().map(|(label, _)| label.to_string()) {
                state.info = format!("Downloading {name}…");
                let _ = cmd_tx.send(UiCommand::Download(name));
            }
        }
        KeyCode::Char('y') => {
            if let Some(url) = state.selected_download_url() {
                state.info = match copy_to_clipboard(url.as_str()) {
                    Ok(()) => format!("✓ Copied to clipboard: {url}"),
                    Err(e) => format!("Clipboard copy failed: {e:#}"),
                };
            }
        }
        _ => {}
    }
}

fn handle_upload_key(state: &mut UiState, code: KeyCode, cmd_tx: &UnboundedSender<UiCommand>) {
    match code {
        KeyCode::Char('a') => {
            state.path_editing = true;
            state.path_input.clear();
        }
        KeyCode::Char('x') => {
            state.staged.pop();
        }
        KeyCode::Char('c') => state.staged.clear(),
        KeyCode::Char('e') => state.generate_excel = !state.generate_excel,
        KeyCode::Char('p') => state.generate_ppt = !state.generate_ppt,
        KeyCode::Char('u') => {
            // Disabled while an upload is in flight.
            if state.submit_enabled {
                let _ = cmd_tx.send(UiCommand::Submit {
                    paths: state.staged.iter().map(|f| f.path.clone()).collect(),
                    generate_excel: state.generate_excel,
                    generate_ppt: state.generate_ppt,
                });
            }
        }
        _ => {}
    }
}

/// Draw the whole screen; returns the number of list rows visible on the Files tab.
fn draw(area: Rect, f: &mut Frame, state: &UiState) -> usize {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(6),
        ])
        .split(area);

    let tabs = Tabs::new(vec!["Files", "Upload", "Help"])
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("transcript-upload-cli"),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    let rows = chunks[1].height.saturating_sub(2) as usize;
    match state.tab {
        TAB_FILES => draw_files(chunks[1], f, state, rows),
        TAB_UPLOAD => draw_upload(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }

    draw_status(chunks[2], f, state);

    if let Some(msg) = state.active_alert() {
        draw_alert(area, f, msg);
    }
    rows
}

fn draw_files(area: Rect, f: &mut Frame, state: &UiState, rows: usize) {
    let lines = list::view_lines(&state.list_view, Some(state.selected));
    let visible: Vec<Line> = lines
        .into_iter()
        .skip(state.scroll_offset)
        .take(rows.max(1))
        .collect();
    let title = match &state.last_refresh {
        Some(t) => format!("Output files ({}) - refreshed {t}", state.files.len()),
        None => "Output files".to_string(),
    };
    let p = Paragraph::new(visible).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn flag_span(label: &'static str, on: bool) -> Span<'static> {
    let (mark, color) = if on {
        ("[x] ", Color::Green)
    } else {
        ("[ ] ", Color::DarkGray)
    };
    Span::styled(format!("{mark}{label}"), Style::default().fg(color))
}

fn draw_upload(area: Rect, f: &mut Frame, state: &UiState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(6),
        ])
        .split(area);

    let submit = if state.processing {
        Span::styled("Processing…", Style::default().fg(Color::Yellow))
    } else if state.submit_enabled {
        Span::styled("u: Upload", Style::default().fg(Color::Cyan))
    } else {
        Span::styled("Upload disabled", Style::default().fg(Color::DarkGray))
    };
    let controls = Paragraph::new(Line::from(vec![
        flag_span("Excel (e)", state.generate_excel),
        Span::raw("   "),
        flag_span("PPT (p)", state.generate_ppt),
        Span::raw("   "),
        submit,
    ]))
    .block(Block::default().borders(Borders::ALL).title("Output formats"));
    f.render_widget(controls, parts[0]);

    let selection =
        crate::view::render_selection(state.staged.iter().map(|s| (s.name.as_str(), s.size)));
    let mut lines = list::view_lines(&selection, None);
    if state.path_editing {
        lines.push(Line::from(vec![
            Span::styled("Path: ", Style::default().fg(Color::Magenta)),
            Span::raw(state.path_input.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]));
    }
    let staged = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Selected files ({})", state.staged.len())),
    );
    f.render_widget(staged, parts[1]);

    let results: Vec<Line> = state
        .last_messages
        .iter()
        .map(|m| Line::from(m.clone()))
        .collect();
    let results = Paragraph::new(results)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Last result"));
    f.render_widget(results, parts[2]);
}

fn draw_status(area: Rect, f: &mut Frame, state: &UiState) {
    let mut lines = Vec::new();
    push_status_field(&mut lines, "Server", state.base_url.as_str(), area.width);
    push_status_field(&mut lines, "Status", &state.info, area.width);
    if let Some(p) = state.log_path.as_ref() {
        push_status_field(&mut lines, "Log", &p.display().to_string(), area.width);
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn centered(area: Rect, width_pct: u16, height: u16) -> Rect {
    let width = area.width * width_pct / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn draw_alert(area: Rect, f: &mut Frame, msg: &str) {
    let popup = centered(area, 60, 7);
    f.render_widget(Clear, popup);
    let p = Paragraph::new(vec![
        Line::from(Span::styled(msg.to_string(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Notice")
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(p, popup);
}
