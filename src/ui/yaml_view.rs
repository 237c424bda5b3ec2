//! YAML manifest view

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::resources::ResourceRef;

pub fn render(frame: &mut Frame, target: &ResourceRef, yaml: &str, scroll: u16) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let lines: Vec<Line> = yaml.lines().map(yaml_line).collect();
    let title = format!(" {}: {} ", target.kind.title(), target.display_name());

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, chunks[0]);

    let help = Line::from(vec![
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Scroll  "),
        Span::styled("e", Style::default().fg(Color::Yellow)),
        Span::raw(" Edit  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" Back"),
    ]);
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );
}

/// Colors mapping keys so nested manifests stay readable
fn yaml_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    }
    match line.split_once(':') {
        Some((key, rest)) if !key.trim_start().contains(' ') || key.trim_start().starts_with("- ") => {
            Line::from(vec![
                Span::styled(format!("{}:", key), Style::default().fg(Color::Cyan)),
                Span::raw(rest.to_string()),
            ])
        }
        _ => Line::from(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceKind;
    use crate::ui::buffer_text;
    use ratatui::{backend::TestBackend, Terminal};

    fn target() -> ResourceRef {
        ResourceRef {
            kind: ResourceKind::Roles,
            name: "pod-reader".to_string(),
            namespace: Some("default".to_string()),
        }
    }

    const YAML: &str = "apiVersion: rbac.authorization.k8s.io/v1\nkind: Role\nmetadata:\n  name: pod-reader\n";

    #[test]
    fn test_renders_title_and_manifest() {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|frame| render(frame, &target(), YAML, 0))
            .unwrap();

        let content = buffer_text(terminal.backend().buffer());
        assert!(content.contains("Roles: default/pod-reader"));
        assert!(content.contains("apiVersion: rbac.authorization.k8s.io/v1"));
        assert!(content.contains("Esc Back"));
    }

    #[test]
    fn test_scroll_skips_leading_lines() {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|frame| render(frame, &target(), YAML, 2))
            .unwrap();

        let content = buffer_text(terminal.backend().buffer());
        assert!(!content.contains("apiVersion"));
        assert!(content.contains("metadata:"));
    }

    #[test]
    fn test_yaml_line_highlights_keys() {
        let line = yaml_line("  name: pod-reader");
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "  name:");

        let plain = yaml_line("some text: with spaces in key");
        assert_eq!(plain.spans.len(), 1);
    }
}
