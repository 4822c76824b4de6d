use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        key_line("any key", 5, "Dismiss a notification"),
        Line::from(""),
        Line::from("Files tab:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
            Span::raw(" or "),
            Span::styled("j/k", Style::default().fg(Color::Magenta)),
            Span::raw("  Navigate"),
        ]),
        key_line("r", 11, "Refresh list"),
        key_line("d", 11, "Delete selected"),
        key_line("s", 11, "Download selected"),
        key_line("y", 11, "Copy download URL to clipboard"),
        Line::from(""),
        Line::from("Upload tab:"),
        key_line("a", 11, "Add a file path (Enter to stage, Esc to cancel)"),
        key_line("x", 11, "Remove last staged file"),
        key_line("c", 11, "Clear staged files"),
        key_line("e", 11, "Toggle Excel output"),
        key_line("p", 11, "Toggle PPT output"),
        key_line("u", 11, "Upload"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
