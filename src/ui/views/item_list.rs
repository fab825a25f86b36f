use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tokio::sync::mpsc;

use crate::api::client::ApiClient;
use crate::api::types::{Item, ItemFields};
use crate::cache::TtlCache;
use crate::grouping::{self, CategoryFilter};
use crate::query::{Query, QueryPhase};
use crate::suggest::SuggestEngine;
use crate::ui::components::{KeyResult, PromptEvent, PromptInput, SearchEvent, SearchInput};
use crate::ui::renderfns::{bucket_color, truncate};
use crate::ui::view::{View, ViewAction};

use super::{grouped_rows, step_selection, GroupingMode, ItemDetailView, Row};

/// Outcome of a spawned write call, applied on tick
enum WriteOutcome {
  Created(Item),
  Updated(Item),
  Deleted(String),
  Failed(String),
}

enum PromptKind {
  Add,
  Move { id: String },
}

/// View for browsing, searching and editing tracked items
pub struct ItemListView {
  api: ApiClient,
  query: Query<Vec<Item>>,
  grouping: GroupingMode,
  filter: CategoryFilter,
  text_filter: String,
  search: SearchInput<Item>,
  prompt: PromptInput,
  prompt_kind: Option<PromptKind>,
  selected: usize,
  writes_tx: mpsc::UnboundedSender<WriteOutcome>,
  writes_rx: mpsc::UnboundedReceiver<WriteOutcome>,
  notice: Option<String>,
  /// Shared with the suggestion engine; writes stale its entries
  suggest_cache: Arc<TtlCache<Vec<Item>>>,
}

impl ItemListView {
  pub fn new(
    api: ApiClient,
    cache_time: Duration,
    suggest_cache: Arc<TtlCache<Vec<Item>>>,
  ) -> Self {
    let api_for_query = api.clone();
    let query = Query::new(move || {
      let api = api_for_query.clone();
      async move { api.fetch_items().await.map_err(|e| e.to_string()) }
    })
    .with_cache_time(cache_time);

    let api_for_suggest = api.clone();
    let engine = SuggestEngine::new(move |query: String| {
      let api = api_for_suggest.clone();
      async move { api.suggest_items(&query).await.map_err(|e| e.to_string()) }
    })
    .with_cache(suggest_cache.clone(), cache_time);

    let (writes_tx, writes_rx) = mpsc::unbounded_channel();

    Self {
      api,
      query,
      grouping: GroupingMode::default(),
      filter: CategoryFilter::All,
      text_filter: String::new(),
      search: SearchInput::new(engine),
      prompt: PromptInput::new(),
      prompt_kind: None,
      selected: 0,
      writes_tx,
      writes_rx,
      notice: None,
      suggest_cache,
    }
  }

  fn items(&self) -> &[Item] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// The record under the cursor, resolved through the current grouping
  fn selected_item(&self) -> Option<&Item> {
    let visible = grouping::visible(self.items(), &self.filter, &self.text_filter);
    let rows = grouped_rows(&visible, self.grouping, Local::now());
    match rows.get(self.selected) {
      Some(Row::Record(item)) => Some(*item),
      _ => None,
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let next = {
      let visible = grouping::visible(self.items(), &self.filter, &self.text_filter);
      let rows = grouped_rows(&visible, self.grouping, Local::now());
      step_selection(&rows, self.selected, delta)
    };
    self.selected = next;
  }

  /// Cycle the category filter: all -> each seen category -> all
  fn cycle_filter(&mut self) {
    let mut values: Vec<String> = Vec::new();
    for item in self.items() {
      if let Some(category) = item.category.as_deref() {
        if !category.trim().is_empty() && !values.iter().any(|v| v == category) {
          values.push(category.to_string());
        }
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

  fn submit_prompt(&mut self, text: String) {
    match &self.prompt_kind {
      Some(PromptKind::Add) => match parse_quick_add(&text) {
        Ok(add) => {
          self.spawn_create(add);
          self.prompt.close();
          self.prompt_kind = None;
        }
        // Validation never reaches the API - the prompt stays open
        Err(message) => self.prompt.reject(message),
      },
      Some(PromptKind::Move { id }) => {
        let location = text.trim();
        if location.is_empty() {
          self.prompt.reject("location is required");
          return;
        }
        let id = id.clone();
        self.spawn_move(id, location.to_string());
        self.prompt.close();
        self.prompt_kind = None;
      }
      None => {}
    }
  }

  fn spawn_create(&self, add: QuickAdd) {
    let api = self.api.clone();
    let tx = self.writes_tx.clone();
    tokio::spawn(async move {
      let outcome = match api
        .create_item(&add.name, &add.location, add.category.as_deref())
        .await
      {
        Ok(item) => WriteOutcome::Created(item),
        Err(e) => WriteOutcome::Failed(format!("add failed: {}", e)),
      };
      let _ = tx.send(outcome);
    });
  }

  fn spawn_move(&self, id: String, location: String) {
    let api = self.api.clone();
    let tx = self.writes_tx.clone();
    tokio::spawn(async move {
      let fields = ItemFields {
        location: Some(location),
        ..Default::default()
      };
      let outcome = match api.update_item(&id, &fields).await {
        Ok(item) => WriteOutcome::Updated(item),
        Err(e) => WriteOutcome::Failed(format!("move failed: {}", e)),
      };
      let _ = tx.send(outcome);
    });
  }

  fn delete_selected(&mut self) {
    let Some(item) = self.selected_item() else {
      return;
    };
    let id = item.id.clone();
    let api = self.api.clone();
    let tx = self.writes_tx.clone();
    tokio::spawn(async move {
      let outcome = match api.delete_item(&id).await {
        Ok(()) => WriteOutcome::Deleted(id),
        Err(e) => WriteOutcome::Failed(format!("delete failed: {}", e)),
      };
      let _ = tx.send(outcome);
    });
  }

  /// Cached suggestions no longer reflect the stored list
  fn stale_suggestions(&self) {
    if self.suggest_cache.len() > 0 {
      tracing::debug!(
        "dropping {} cached suggestion queries after a write",
        self.suggest_cache.len()
      );
      self.suggest_cache.clear();
    }
  }

  /// Mirror confirmed writes into the cached list; resync on failure
  fn apply_write_outcomes(&mut self) {
    while let Ok(outcome) = self.writes_rx.try_recv() {
      match outcome {
        WriteOutcome::Created(item) => {
          self.notice = None;
          self.stale_suggestions();
          self.query.update_data(|items| items.insert(0, item));
        }
        WriteOutcome::Updated(updated) => {
          self.notice = None;
          self.stale_suggestions();
          self.query.update_data(|items| {
            if let Some(slot) = items.iter_mut().find(|i| i.id == updated.id) {
              *slot = updated;
            }
          });
        }
        WriteOutcome::Deleted(id) => {
          self.notice = None;
          self.stale_suggestions();
          self.query.update_data(|items| items.retain(|i| i.id != id));
        }
        WriteOutcome::Failed(message) => {
          tracing::warn!("item write failed: {}", message);
          self.notice = Some(message);
          // The local mirror may be out of step with the backend now
          self.query.invalidate_cache();
          self.query.fetch(false);
        }
      }
    }
  }

  fn row_to_list_item(&self, row: &Row<'_, Item>, now: DateTime<Utc>) -> ListItem<'static> {
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
      Row::Record(item) => {
        let mut spans = vec![
          Span::raw("  "),
          Span::styled(
            format!("{:<30}", truncate(&item.name, 30)),
            Style::default().fg(Color::White),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<20}", truncate(&item.location, 20)),
            Style::default().fg(Color::Cyan),
          ),
        ];
        if let Some(category) = &item.category {
          spans.push(Span::styled(
            format!(" #{}", category),
            Style::default().fg(Color::DarkGray),
          ));
        }
        if grouping::is_recently_added(item.created_at, now) {
          spans.push(Span::styled(" ● new", Style::default().fg(Color::Green)));
        }
        ListItem::new(Line::from(spans))
      }
    }
  }

  fn title(&self, visible_count: usize) -> String {
    match self.query.phase() {
      QueryPhase::Loading => " Items (loading...) ".to_string(),
      QueryPhase::Failed => {
        format!(" Items (error: {}) ", self.query.error().unwrap_or("unknown"))
      }
      _ => format!(
        " Items ({}) [{}] [filter: {}] ",
        visible_count,
        self.grouping.label(),
        self.filter.label()
      ),
    }
  }
}

impl View for ItemListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Prompt has priority while open
    if self.prompt.is_active() {
      match self.prompt.handle_key(key) {
        KeyResult::Event(PromptEvent::Submitted(text)) => self.submit_prompt(text),
        KeyResult::Event(PromptEvent::Cancelled) => self.prompt_kind = None,
        _ => {}
      }
      return ViewAction::None;
    }

    // Then the search overlay
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
      KeyCode::Char('a') => {
        self.prompt_kind = Some(PromptKind::Add);
        self.prompt.open("Add item", "name @ location #category", "");
      }
      KeyCode::Char('m') => {
        if let Some(item) = self.selected_item() {
          let id = item.id.clone();
          let location = item.location.clone();
          self.prompt_kind = Some(PromptKind::Move { id });
          self.prompt.open("Move item", "new location", &location);
        }
      }
      KeyCode::Char('d') => self.delete_selected(),
      KeyCode::Enter => {
        if let Some(item) = self.selected_item() {
          return ViewAction::Push(Box::new(ItemDetailView::new(item.clone())));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn handle_mouse(&mut self, column: u16, row: u16) {
    self.search.handle_mouse(column, row);
  }

  fn capturing_input(&self) -> bool {
    self.prompt.is_active() || self.search.is_active()
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let (list_items, normalized, visible_count) = {
      let visible = grouping::visible(self.items(), &self.filter, &self.text_filter);
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
        "Failed to load items. Press 'r' to retry."
      } else if self.items().is_empty() {
        "Nothing tracked yet. Press 'a' to add an item."
      } else {
        "No items match the current search/filter."
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
    self.prompt.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Items".to_string()
  }

  fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  fn tick(&mut self) {
    self.query.poll();
    self.search.tick();
    self.apply_write_outcomes();
  }
}

/// Parsed "name @ location #category" quick-add line
struct QuickAdd {
  name: String,
  location: String,
  category: Option<String>,
}

/// Parse the quick-add syntax. Name and location are required; a trailing
/// "#category" is optional.
fn parse_quick_add(text: &str) -> Result<QuickAdd, &'static str> {
  let (rest, category) = match text.split_once('#') {
    Some((rest, category)) => {
      let category = category.trim();
      (rest, (!category.is_empty()).then(|| category.to_string()))
    }
    None => (text, None),
  };

  let (name, location) = rest
    .split_once('@')
    .ok_or("expected: name @ location #category")?;
  let name = name.trim();
  let location = location.trim();
  if name.is_empty() || location.is_empty() {
    return Err("name and location are required");
  }

  Ok(QuickAdd {
    name: name.to_string(),
    location: location.to_string(),
    category,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_quick_add_full_line() {
    let add = parse_quick_add("Car Keys @ Hallway drawer #Keys").unwrap();
    assert_eq!(add.name, "Car Keys");
    assert_eq!(add.location, "Hallway drawer");
    assert_eq!(add.category.as_deref(), Some("Keys"));
  }

  #[test]
  fn test_quick_add_without_category() {
    let add = parse_quick_add("Passport @ Safe").unwrap();
    assert_eq!(add.name, "Passport");
    assert_eq!(add.location, "Safe");
    assert_eq!(add.category, None);
  }

  #[test]
  fn test_quick_add_missing_location_is_rejected() {
    assert!(parse_quick_add("Passport @ ").is_err());
    assert!(parse_quick_add("Passport").is_err());
    assert!(parse_quick_add(" @ Safe").is_err());
  }

  #[test]
  fn test_quick_add_blank_category_is_dropped() {
    let add = parse_quick_add("Drill @ Garage #").unwrap();
    assert_eq!(add.category, None);
  }
}
