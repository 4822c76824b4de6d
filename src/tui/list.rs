//! ViewNode → ratatui conversion.

use crate::view::{icon_tag, Icon, NoticeLevel, ViewNode};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

fn icon_color(icon: Icon) -> Color {
    match icon {
        Icon::Spreadsheet => Color::Green,
        Icon::Slides => Color::LightRed,
        Icon::Document => Color::Gray,
        Icon::Transcript => Color::Blue,
    }
}

/// One line per leaf node. `highlight` marks the n-th item as selected.
pub fn view_lines(node: &ViewNode, highlight: Option<usize>) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let mut item_idx = 0usize;
    push(node, highlight, &mut item_idx, &mut out);
    out
}

fn push(node: &ViewNode, highlight: Option<usize>, item_idx: &mut usize, out: &mut Vec<Line<'static>>) {
    match node {
        ViewNode::List(children) => {
            for c in children {
                push(c, highlight, item_idx, out);
            }
        }
        ViewNode::Item {
            icon,
            label,
            detail,
            ..
        } => {
            let selected = highlight == Some(*item_idx);
            *item_idx += 1;
            let label_style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut spans = vec![
                Span::raw(if selected { "> " } else { "  " }),
                Span::styled(icon_tag(*icon), Style::default().fg(icon_color(*icon))),
                Span::raw(" "),
                Span::styled(label.clone(), label_style),
            ];
            if let Some(d) = detail {
                spans.push(Span::styled(
                    format!(" ({d})"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            out.push(Line::from(spans));
        }
        ViewNode::Placeholder(text) => out.push(Line::from(Span::styled(
            text.clone(),
            Style::default().fg(Color::DarkGray),
        ))),
        ViewNode::Text(text) => out.push(Line::from(text.clone())),
        ViewNode::Notice { level, text } => {
            let color = match level {
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Error => Color::Red,
            };
            out.push(Line::from(Span::styled(
                text.clone(),
                Style::default().fg(color),
            )));
        }
    }
}
