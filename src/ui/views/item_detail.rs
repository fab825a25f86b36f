use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::api::types::Item;
use crate::grouping;
use crate::ui::view::{View, ViewAction};

/// Detail view for a single item. Renders the already-loaded record - no
/// extra fetch is needed.
pub struct ItemDetailView {
  item: Item,
}

impl ItemDetailView {
  pub fn new(item: Item) -> Self {
    Self { item }
  }

  fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
      Span::styled(format!("{:<10}", label), Style::default().fg(Color::DarkGray)),
      Span::raw(value),
    ])
  }
}

impl View for ItemDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.item.name))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let added = self
      .item
      .created_at
      .with_timezone(&Local)
      .format("%Y-%m-%d %H:%M")
      .to_string();

    let mut lines = vec![
      Self::field("Name", self.item.name.clone()),
      Self::field("Location", self.item.location.clone()),
      Self::field(
        "Category",
        self
          .item
          .category
          .clone()
          .unwrap_or_else(|| "Uncategorized".to_string()),
      ),
      Self::field("Added", added),
    ];

    if grouping::is_recently_added(self.item.created_at, Utc::now()) {
      lines.push(Line::from(Span::styled(
        "● recently added",
        Style::default().fg(Color::Green),
      )));
    }

    if let Some(url) = self.item.image_url.as_deref() {
      lines.push(Line::raw(""));
      lines.push(Self::field("Photo", url.to_string()));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
      format!("id: {}", self.item.id),
      Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.item.name.clone()
  }
}
