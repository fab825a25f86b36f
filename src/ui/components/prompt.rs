use super::input::{InputResult, TextInput};
use super::key_result::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by a prompt that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  /// Enter pressed with the current text. The prompt stays open so the
  /// parent can reject the value with an inline error.
  Submitted(String),
  /// Escape pressed, prompt dismissed
  Cancelled,
}

/// One-line prompt overlay for quick writes (add item, change location).
///
/// Validation is synchronous: the parent checks the submitted text and calls
/// `reject` to keep the prompt open with an error line, or `close` to accept.
#[derive(Debug, Clone, Default)]
pub struct PromptInput {
  input: TextInput,
  title: String,
  hint: String,
  error: Option<String>,
  active: bool,
}

impl PromptInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the prompt with a title, a dim hint line and optional initial text.
  pub fn open(&mut self, title: &str, hint: &str, initial: &str) {
    self.title = format!(" {} ", title);
    self.hint = hint.to_string();
    self.error = None;
    self.active = true;
    self.input.set_value(initial);
  }

  /// Keep the prompt open, showing why the value was not accepted.
  pub fn reject(&mut self, error: &str) {
    self.error = Some(error.to_string());
  }

  /// Accept and dismiss.
  pub fn close(&mut self) {
    self.active = false;
    self.error = None;
    self.input.clear();
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PromptEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(value) => KeyResult::Event(PromptEvent::Submitted(value)),
      InputResult::Cancelled => {
        self.close();
        KeyResult::Event(PromptEvent::Cancelled)
      }
      InputResult::Consumed => {
        // Typing clears a stale validation message
        self.error = None;
        KeyResult::Handled
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Render the prompt overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 70 / 100).clamp(34, 70);
    // Input line, hint line, plus an error line when present
    let height = if self.error.is_some() { 5 } else { 4 };

    let x = area.x + 1;
    let y = area.y + 1;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Magenta))
      .title(self.title.clone());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let mut lines = vec![
      Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Magenta)),
        Span::raw(self.input.value()),
        Span::styled("_", Style::default().fg(Color::Magenta)),
      ]),
      Line::from(Span::styled(
        self.hint.clone(),
        Style::default().fg(Color::DarkGray),
      )),
    ];
    if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }
}
