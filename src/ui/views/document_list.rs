use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::api::client::ApiClient;
use crate::api::types::Document;
use crate::cache::TtlCache;
use crate::grouping::{self, CategoryFilter};
use crate::query::{Query, QueryPhase};
use crate::suggest::SuggestEngine;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{bucket_color, truncate};
use crate::ui::view::{View, ViewAction};

use super::{grouped_rows, step_selection, GroupingMode, Row};

/// Read-only view for browsing and searching tracked documents
pub struct DocumentListView {
  query: Query<Vec<Document>>,
  grouping: GroupingMode,
  filter: CategoryFilter,
  text_filter: String,
  search: SearchInput<Document>,
  selected: usize,
}

impl DocumentListView {
  pub fn new(
    api: ApiClient,
    cache_time: Duration,
    suggest_cache: Arc<TtlCache<Vec<Document>>>,
  ) -> Self {
    let api_for_query = api.clone();
    let query = Query::new(move || {
      let api = api_for_query.clone();
      async move { api.fetch_documents().await.map_err(|e| e.to_string()) }
    })
    .with_cache_time(cache_time);

    let engine = SuggestEngine::new(move |query: String| {
      let api = api.clone();
      async move { api.suggest_documents(&query).await.map_err(|e| e.to_string()) }
    })
    .with_cache(suggest_cache, cache_time);

    Self {
      query,
      // Documents read most naturally by type
      grouping: GroupingMode::Category,
      filter: CategoryFilter::All,
      text_filter: String::new(),
      search: SearchInput::new(engine),
      selected: 0,
    }
  }

  fn documents(&self) -> &[Document] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn move_selection(&mut self, delta: i32) {
    let next = {
      let visible = grouping::visible(self.documents(), &self.filter, &self.text_filter);
      let rows = grouped_rows(&visible, self.grouping, Local::now());
      step_selection(&rows, self.selected, delta)
    };
    self.selected = next;
  }

  /// Cycle the type filter: all -> each seen type -> all
  fn cycle_filter(&mut self) {
    let mut values: Vec<String> = Vec::new();
    for doc in self.documents() {
      if !doc.doc_type.trim().is_empty() && !values.iter().any(|v| v == &doc.doc_type) {
        values.push(doc.doc_type.clone());
      }
    }

    self.filter = match &self.filter {
      CategoryFilter::All => match values.first() {
        Some(first) => CategoryFilter::Only(first.clone()),
        None => CategoryFilter::All,
      },
      CategoryFilter::Only(current) => match values.iter().position(|v| v == current) {
        Some(i) if i + 1 < values.len() => CategoryFilter::Only(values[i + 1].clone()),
        _ => CategoryFilter::All,
      },
    };
    self.selected = 0;
  }

  fn row_to_list_item(&self, row: &Row<'_, Document>, now: DateTime<Utc>) -> ListItem<'static> {
    match row {
      Row::Header {
        label,
        count,
        bucket,
      } => {
        let color = bucket.map(bucket_color).unwrap_or(Color::Magenta);
        ListItem::new(Line::from(Span::styled(
          format!("▸ {} ({})", label, count),
          Style::default().fg(color).bold(),
        )))
      }
      Row::Record(doc) => {
        let mut spans = vec![
          Span::raw("  "),
          Span::styled(
            format!("{:<34}", truncate(&doc.name, 34)),
            Style::default().fg(Color::White),
          ),
        ];
        if let Some(notes) = doc.notes.as_deref() {
          if !notes.is_empty() {
            spans.push(Span::styled(
              format!(" {}", truncate(notes, 30)),
              Style::default().fg(Color::DarkGray),
            ));
          }
        }
        if grouping::is_recently_added(doc.created_at, now) {
          spans.push(Span::styled(" ● new", Style::default().fg(Color::Green)));
        }
        ListItem::new(Line::from(spans))
      }
    }
  }

  fn title(&self, visible_count: usize) -> String {
    match self.query.phase() {
      QueryPhase::Loading => " Documents (loading...) ".to_string(),
      QueryPhase::Failed => format!(
        " Documents (error: {}) ",
        self.query.error().unwrap_or("unknown")
      ),
      _ => format!(
        " Documents ({}) [{}] [filter: {}] ",
        visible_count,
        self.grouping.label(),
        self.filter.label()
      ),
    }
  }
}

impl View for DocumentListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Changed(query) | SearchEvent::Submitted(query)) => {
        self.text_filter = query;
        self.selected = 0;
        return ViewAction::None;
      }
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::Char('g') => {
        self.grouping = self.grouping.toggled();
        self.selected = 0;
      }
      KeyCode::Char('f') => self.cycle_filter(),
      KeyCode::Char('r') => self.query.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn handle_mouse(&mut self, column: u16, row: u16) {
    self.search.handle_mouse(column, row);
  }

  fn capturing_input(&self) -> bool {
    self.search.is_active()
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let (list_items, normalized, visible_count) = {
      let visible = grouping::visible(self.documents(), &self.filter, &self.text_filter);
      let visible_count = visible.len();
      let rows = grouped_rows(&visible, self.grouping, Local::now());
      let normalized = step_selection(&rows, self.selected, 0);
      let now = Utc::now();
      let list_items: Vec<ListItem<'static>> = rows
        .iter()
        .map(|row| self.row_to_list_item(row, now))
        .collect();
      (list_items, normalized, visible_count)
    };
    self.selected = normalized;

    let block = Block::default()
      .title(self.title(visible_count))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if list_items.is_empty() && !self.query.is_loading() {
      let content = if self.query.phase() == QueryPhase::Failed {
        "Failed to load documents. Press 'r' to retry."
      } else if self.documents().is_empty() {
        "No documents tracked."
      } else {
        "No documents match the current search/filter."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
    } else {
      let list = List::new(list_items)
        .block(block)
        .highlight_style(
          Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

      let mut state = ListState::default();
      state.select(Some(self.selected));
      frame.render_stateful_widget(list, area, &mut state);
    }

    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Documents".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
    self.search.tick();
  }
}
