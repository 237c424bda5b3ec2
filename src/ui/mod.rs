//! UI rendering module for the KubeGraf console
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod dialog;
pub mod help_overlay;
pub mod resource_table;
pub mod yaml_view;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, AppState};

/// Renders the UI based on the current application state
pub fn render(frame: &mut Frame, app: &App) {
    match &app.state {
        AppState::Loading => render_loading(frame, app),
        AppState::ResourceList => resource_table::render(frame, app),
        AppState::YamlView { target, yaml } => yaml_view::render(frame, target, yaml, app.yaml_scroll),
        AppState::ConfirmDelete(target) => {
            resource_table::render(frame, app);
            dialog::render_confirm_delete(frame, target);
        }
        AppState::ScaleInput { target, input } => {
            resource_table::render(frame, app);
            dialog::render_scale_input(frame, target, input);
        }
    }

    if app.show_help {
        help_overlay::render(frame);
    }
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new(format!("Loading {}...", app.current_kind().title()))
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Helper function to create a centered rect
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height.min(area.height)),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width.min(area.width)),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Flattens a rendered buffer into one string for assertions
#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    buffer.content().iter().map(|cell| cell.symbol()).collect()
}
