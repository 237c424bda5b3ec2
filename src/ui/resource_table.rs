//! Resource table screen rendering
//!
//! Renders the kind tabs, the table of resources for the selected kind, a
//! status line for notifications and data freshness, and the key hints.

use std::time::Duration;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame,
};

use crate::app::{App, StatusLevel};
use crate::resources::{ResourceKind, ResourceRow};

/// Widest a column may grow before its cells are truncated
const MAX_COLUMN_WIDTH: u16 = 48;

/// Renders the resource table view
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Kind tabs
            Constraint::Min(3),    // Table
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help text
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
    render_help(frame, chunks[3]);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = ResourceKind::all()
        .iter()
        .map(|kind| Line::from(kind.title()))
        .collect();

    let title = format!(
        " KubeGraf │ {} │ {} ",
        app.scope.cluster,
        app.scope.namespace_label()
    );

    let tabs = Tabs::new(titles)
        .select(app.kind_index)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider("│");

    frame.render_widget(tabs, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let kind = app.current_kind();
    let rows = app.rows();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ({}) ", kind.title(), rows.len()));

    if rows.is_empty() {
        let (text, color) = if app.is_loading() {
            (format!("Loading {}...", kind.title()), Color::Cyan)
        } else if let Some(error) = app.table_error() {
            (format!("Failed to load {}: {}", kind.title(), error), Color::Red)
        } else {
            (format!("No {} found", kind.title()), Color::DarkGray)
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let columns = kind.columns();
    let header = Row::new(columns.iter().map(|c| Cell::from(*c))).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let table_rows = rows
        .iter()
        .map(|row| Row::new(row.cells.iter().map(|c| Cell::from(c.as_str()))));

    let table = Table::new(table_rows, column_widths(columns, &rows))
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

/// Sizes each column to its widest cell, capped at `MAX_COLUMN_WIDTH`
fn column_widths(columns: &[&str], rows: &[ResourceRow]) -> Vec<Constraint> {
    columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.cells.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0);
            let width = u16::try_from(widest).unwrap_or(u16::MAX);
            Constraint::Length(width.min(MAX_COLUMN_WIDTH))
        })
        .collect()
}

/// Renders the latest notification, or the data freshness when there is none
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        Some(status) => {
            let color = match status.level {
                StatusLevel::Info => Color::Green,
                StatusLevel::Error => Color::Red,
            };
            Line::from(Span::styled(status.text.clone(), Style::default().fg(color)))
        }
        None => Line::from(Span::styled(
            freshness_label(app.data_age()),
            Style::default().fg(Color::DarkGray),
        )),
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// "Data: just now", "Data: 42s ago", "Data: 3m ago"
pub fn freshness_label(age: Option<Duration>) -> String {
    match age.map(|age| age.as_secs()) {
        None => "Data: not loaded".to_string(),
        Some(secs) if secs < 1 => "Data: just now".to_string(),
        Some(secs) if secs < 60 => format!("Data: {}s ago", secs),
        Some(secs) if secs < 3600 => format!("Data: {}m ago", secs / 60),
        Some(secs) => format!("Data: {}h ago", secs / 3600),
    }
}

/// Renders the help text at the bottom of the screen
fn render_help(frame: &mut Frame, area: Rect) {
    let help_spans = vec![
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Navigate  "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Kind  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" YAML  "),
        Span::styled("n", Style::default().fg(Color::Yellow)),
        Span::raw(" Namespace  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Refresh  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" Help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ];

    let paragraph = Paragraph::new(Line::from(help_spans)).style(Style::default().fg(Color::DarkGray));

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::app::{AppState, StatusMessage};
    use crate::cache::{CacheOptions, ResourceCache, Scope};
    use crate::resources::ResourceRef;
    use crate::ui::buffer_text;
    use ratatui::{backend::TestBackend, Terminal};

    fn test_app() -> App {
        let mut app = App::new(
            ApiClient::new("http://127.0.0.1:9").unwrap(),
            ResourceCache::new(),
            Scope::new("prod", vec!["db".to_string()]),
            CacheOptions::default(),
        );
        app.state = AppState::ResourceList;
        app
    }

    fn draw(app: &App) -> String {
        let backend = TestBackend::new(180, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_tabs_and_scope_are_rendered() {
        let content = draw(&test_app());
        assert!(content.contains("KubeGraf"));
        assert!(content.contains("prod"));
        assert!(content.contains("db"));
        assert!(content.contains("StatefulSets"));
        assert!(content.contains("CRDs"));
    }

    #[test]
    fn test_empty_table_placeholder() {
        let content = draw(&test_app());
        assert!(content.contains("No StatefulSets found"));
        assert!(content.contains("Data: not loaded"));
    }

    #[test]
    fn test_status_message_replaces_freshness() {
        let mut app = test_app();
        app.status = Some(StatusMessage::error("Delete failed: forbidden"));
        let content = draw(&app);
        assert!(content.contains("Delete failed: forbidden"));
        assert!(!content.contains("Data:"));
    }

    #[test]
    fn test_help_text_is_rendered() {
        let content = draw(&test_app());
        assert!(content.contains("Navigate"));
        assert!(content.contains("Quit"));
    }

    #[tokio::test]
    async fn test_rows_and_selection_are_rendered() {
        let rows = ["postgres", "redis"]
            .iter()
            .map(|name| ResourceRow {
                target: ResourceRef {
                    kind: ResourceKind::StatefulSets,
                    name: name.to_string(),
                    namespace: Some("db".to_string()),
                },
                cells: vec!["db".to_string(), name.to_string(), "1/1".to_string()],
            })
            .collect();
        let mut app = test_app().with_rows(ResourceKind::StatefulSets, rows).await;
        app.selected_index = 1;

        let content = draw(&app);
        assert!(content.contains("StatefulSets (2)"));
        assert!(content.contains("REPLICAS"));
        assert!(content.contains("postgres"));
        assert!(content.contains("▶ db"), "selected row is highlighted");
        assert!(content.contains("Data: just now"));
    }

    #[test]
    fn test_column_widths_fit_widest_cell() {
        let rows = vec![ResourceRow {
            target: ResourceRef {
                kind: ResourceKind::Roles,
                name: "a-rather-long-role-name".to_string(),
                namespace: None,
            },
            cells: vec!["a-rather-long-role-name".to_string(), "x".to_string()],
        }];
        let widths = column_widths(&["NAME", "NAMESPACE"], &rows);
        assert_eq!(widths, vec![Constraint::Length(23), Constraint::Length(9)]);
    }

    #[test]
    fn test_huge_cell_is_capped_not_wrapped() {
        // 65_546 wraps to 10 if narrowed to u16 before capping
        let rows = vec![ResourceRow {
            target: ResourceRef {
                kind: ResourceKind::CustomResourceDefinitions,
                name: "blob".to_string(),
                namespace: None,
            },
            cells: vec!["x".repeat(65_546)],
        }];
        let widths = column_widths(&["DATA"], &rows);
        assert_eq!(widths, vec![Constraint::Length(MAX_COLUMN_WIDTH)]);
    }

    #[test]
    fn test_freshness_label() {
        assert_eq!(freshness_label(None), "Data: not loaded");
        assert_eq!(freshness_label(Some(Duration::from_millis(300))), "Data: just now");
        assert_eq!(freshness_label(Some(Duration::from_secs(42))), "Data: 42s ago");
        assert_eq!(freshness_label(Some(Duration::from_secs(180))), "Data: 3m ago");
        assert_eq!(freshness_label(Some(Duration::from_secs(7300))), "Data: 2h ago");
    }
}
