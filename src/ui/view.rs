use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, prompts) and return actions
/// for the App to execute. This creates a clean delegation chain:
/// App → View → Components
///
/// Views that load data asynchronously own a Query<T> and poll it in tick().
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Handle a pointer press at (column, row).
  ///
  /// Overlays use this to close on clicks outside their own area.
  fn handle_mouse(&mut self, _column: u16, _row: u16) {}

  /// Whether an overlay of this view is consuming raw text right now.
  /// While true, App must not intercept keys for its own overlays.
  fn capturing_input(&self) -> bool {
    false
  }

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Transient message for the footer (e.g. a failed write)
  fn notice(&self) -> Option<&str> {
    None
  }

  /// Called on each tick to let views poll queries and debounce timers
  fn tick(&mut self) {}
}
