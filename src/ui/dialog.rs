//! Modal prompts drawn over the resource table

use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use crate::resources::ResourceRef;

/// Asks the user to confirm a delete
pub fn render_confirm_delete(frame: &mut Frame, target: &ResourceRef) {
    let lines = vec![
        Line::from(vec![
            Span::raw("Delete "),
            Span::styled(
                target.kind.title(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                target.display_name(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("?"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Yellow)),
            Span::raw(" Confirm  "),
            Span::styled("n/Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" Cancel"),
        ]),
    ];

    render_modal(frame, " Confirm delete ", Color::Red, lines);
}

/// Prompts for the replica count of a scale
pub fn render_scale_input(frame: &mut Frame, target: &ResourceRef, input: &str) {
    let lines = vec![
        Line::from(format!("Scale {} to:", target.display_name())),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("{}█", input),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" replicas"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" Apply  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" Cancel"),
        ]),
    ];

    render_modal(frame, " Scale ", Color::Cyan, lines);
}

fn render_modal(frame: &mut Frame, title: &'static str, color: Color, lines: Vec<Line<'_>>) {
    let height = lines.len() as u16 + 2;
    let area = centered_rect(56, height, frame.area());

    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
