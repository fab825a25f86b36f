use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;

use crate::api::client::ApiClient;
use crate::api::types::{Document, Item};
use crate::cache::TtlCache;
use crate::config::{Config, StartView};
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{DocumentListView, ItemListView};

/// How often the UI wakes up to poll queries and debounce timers
const TICK_RATE: Duration = Duration::from_millis(50);

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command overlay (after pressing :)
  command: CommandInput,

  /// Backend client
  api: ApiClient,

  /// Application configuration
  config: Config,

  /// Suggestion caches, shared across view generations so a recreated view
  /// still benefits from earlier queries
  item_suggestions: Arc<TtlCache<Vec<Item>>>,
  doc_suggestions: Arc<TtlCache<Vec<Document>>>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config)?;
    let item_suggestions = Arc::new(TtlCache::new());
    let doc_suggestions = Arc::new(TtlCache::new());

    let root: Box<dyn View> = match config.default_view {
      StartView::Items => Box::new(ItemListView::new(
        api.clone(),
        config.cache_time(),
        item_suggestions.clone(),
      )),
      StartView::Docs => Box::new(DocumentListView::new(
        api.clone(),
        config.cache_time(),
        doc_suggestions.clone(),
      )),
    };

    Ok(Self {
      view_stack: vec![root],
      command: CommandInput::new(),
      api,
      config,
      item_suggestions,
      doc_suggestions,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Mouse(mouse) => {
        if let Some(view) = self.view_stack.last_mut() {
          view.handle_mouse(mouse.column, mouse.row);
        }
      }
      Event::Tick => {
        if let Some(view) = self.view_stack.last_mut() {
          view.tick();
        }
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    // Ctrl-C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Command overlay first, unless a view overlay is consuming text
    let view_capturing = self
      .view_stack
      .last()
      .is_some_and(|view| view.capturing_input());
    if self.command.is_active() || !view_capturing {
      match self.command.handle_key(key) {
        KeyResult::Handled => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::NotHandled => {}
      }
    }

    // Delegate to the active view
    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    tracing::debug!("executing command: {}", cmd);
    match cmd {
      "items" => {
        self.view_stack.clear();
        self.view_stack.push(Box::new(ItemListView::new(
          self.api.clone(),
          self.config.cache_time(),
          self.item_suggestions.clone(),
        )));
      }
      "docs" => {
        self.view_stack.clear();
        self.view_stack.push(Box::new(DocumentListView::new(
          self.api.clone(),
          self.config.cache_time(),
          self.doc_suggestions.clone(),
        )));
      }
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        tracing::debug!("unknown command: {}", cmd);
      }
    }
  }

  // Accessors for UI rendering

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn current_notice(&self) -> Option<&str> {
    self.view_stack.last().and_then(|view| view.notice())
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn api_url(&self) -> &str {
    &self.config.api.url
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }
}
