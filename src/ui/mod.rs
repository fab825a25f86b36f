pub mod components;
mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function: header, active view, footer, command overlay
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], app.api_url());

  let breadcrumb = app.view_breadcrumb();
  let content = chunks[1];
  let footer = chunks[2];

  if let Some(view) = app.current_view_mut() {
    view.render(frame, content);
  }

  let notice = app.current_notice().map(str::to_string);
  components::draw_footer(frame, footer, &breadcrumb, notice.as_deref());

  // Command overlay sits above everything
  app.command_input().render_overlay(frame, content);
}
