use super::input::{InputResult, TextInput};
use super::key_result::KeyResult;
use crate::grouping::Stored;
use crate::suggest::SuggestEngine;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Position;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Most suggestions shown in the panel at once
const MAX_SUGGESTIONS: usize = 6;

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Search query changed (emitted on each keystroke, empty string on cancel)
  Changed(String),
  /// Search submitted with the final query (overlay closed, filter persists)
  Submitted(String),
}

/// Search overlay with a debounced autocomplete panel.
///
/// Typing feeds the suggestion engine; Down/Up walk the panel, Enter picks
/// the highlighted suggestion (or submits the raw query), and a pointer
/// press outside the overlay closes the panel without cancelling an
/// in-flight suggestion fetch.
pub struct SearchInput<T> {
  input: TextInput,
  active: bool,
  engine: SuggestEngine<T>,
  selected: usize,
  /// Overlay rect from the last render, for outside-click detection
  last_area: Option<Rect>,
}

impl<T: Stored + Clone + Send + 'static> SearchInput<T> {
  pub fn new(engine: SuggestEngine<T>) -> Self {
    Self {
      input: TextInput::new(),
      active: false,
      engine,
      selected: 0,
      last_area: None,
    }
  }

  /// Check if search is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Activate search mode
  pub fn activate(&mut self) {
    self.active = true;
    self.input.clear();
    self.selected = 0;
    // Drop anything left over from the previous search session
    self.engine.input("");
  }

  /// Drive the debounce timer and apply arrived suggestions.
  /// Returns `true` if the suggestion list changed.
  pub fn tick(&mut self) -> bool {
    self.engine.tick();
    let changed = self.engine.poll();
    if changed {
      self.selected = 0;
    }
    changed
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    // If not active, check for activation key
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    // Panel navigation while suggestions are showing
    if self.engine.is_visible() {
      let shown = self.engine.results().len().min(MAX_SUGGESTIONS);
      match key.code {
        KeyCode::Down | KeyCode::Tab if shown > 0 => {
          self.selected = (self.selected + 1) % shown;
          return KeyResult::Handled;
        }
        KeyCode::Up | KeyCode::BackTab if shown > 0 => {
          self.selected = if self.selected == 0 {
            shown - 1
          } else {
            self.selected - 1
          };
          return KeyResult::Handled;
        }
        _ => {}
      }
    }

    // Delegate to TextInput
    match self.input.handle_key(key) {
      InputResult::Submitted(raw) => {
        self.active = false;
        // Picking a suggestion replaces the query; either way the panel
        // closes while any in-flight fetch keeps running.
        let query = match self.engine.results().get(self.selected) {
          Some(hit) if self.engine.is_visible() => hit.name().to_string(),
          _ => raw,
        };
        self.input.set_value(&query);
        self.engine.dismiss();
        KeyResult::Event(SearchEvent::Submitted(query))
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        self.engine.input("");
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::Consumed => {
        self.selected = 0;
        self.engine.input(self.input.value());
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// A pointer press landed at (column, row).
  ///
  /// Outside the overlay this closes the suggestion panel - the fetch, if
  /// one is in flight, is left running.
  pub fn handle_mouse(&mut self, column: u16, row: u16) {
    if !self.engine.is_visible() {
      return;
    }
    let inside = self
      .last_area
      .is_some_and(|area| area.contains(Position::new(column, row)));
    if !inside {
      self.engine.dismiss();
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&mut self, frame: &mut Frame, area: Rect) {
    if !self.active {
      self.last_area = None;
      return;
    }

    let shown = if self.engine.is_visible() {
      self.engine.results().len().min(MAX_SUGGESTIONS)
    } else {
      0
    };

    let width = (area.width * 60 / 100).clamp(30, 60);
    let height = 3 + shown as u16;

    // Position at top-left of content area with small margin
    let x = area.x + 1;
    let y = area.y + 1;

    let overlay_area = Rect::new(x, y, width, height);
    self.last_area = Some(overlay_area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Input line
        Constraint::Min(0),    // Suggestions
      ])
      .split(inner);

    // Draw input line
    let mut input_spans = vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value().to_string()),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
    ];
    if self.engine.is_busy() {
      input_spans.push(Span::styled(
        "  searching…",
        Style::default().fg(Color::DarkGray),
      ));
    }
    frame.render_widget(Paragraph::new(Line::from(input_spans)), chunks[0]);

    // Draw the suggestion panel
    if shown > 0 && chunks[1].height > 0 {
      let items: Vec<ListItem> = self
        .engine
        .results()
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(|hit| {
          let mut spans = vec![Span::styled(
            hit.name().to_string(),
            Style::default().fg(Color::Cyan),
          )];
          if let Some(notes) = hit.notes() {
            if !notes.is_empty() {
              spans.push(Span::raw("  "));
              spans.push(Span::styled(
                notes.to_string(),
                Style::default().fg(Color::DarkGray),
              ));
            }
          }
          ListItem::new(Line::from(spans))
        })
        .collect();

      let list =
        List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

      let mut state = ListState::default();
      state.select(Some(self.selected));

      frame.render_stateful_widget(list, chunks[1], &mut state);
    }
  }
}
