use crate::cache::{
  AssetRequest, CacheManifest, CacheWorker, FetchResponse, HttpFetcher, SqliteStorage,
};
use crate::config::Config;
use crate::event::{CacheEvent, Event, EventHandler};
use crate::store::{Filter, TaskStore};
use crate::theme::Theme;
use crate::ui;
use crate::ui::components::{InputResult, TextInput};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Typing into the new-task line
  Insert,
  /// Inline edit of one task
  Edit,
}

/// The one in-flight inline edit. The mode machine holds at most one, so
/// edit sessions are mutually exclusive by construction.
#[derive(Debug)]
pub struct EditSession {
  pub id: String,
  pub input: TextInput,
}

/// Main application state
pub struct App {
  /// Task collection, source of truth for the list
  store: TaskStore,

  /// Active view filter; selecting one never mutates the collection
  filter: Filter,

  /// Selected row within the filtered view
  selected: usize,

  /// Current input mode
  mode: Mode,

  /// New-task input line
  input: TextInput,

  /// In-flight edit session, if any
  edit: Option<EditSession>,

  /// Theme preference
  theme: Theme,

  /// Whether the install hint is visible in the footer
  install_hint: bool,

  /// Offline asset cache, absent when disabled or unavailable
  worker: Option<CacheWorker<SqliteStorage>>,
  fetcher: Option<HttpFetcher>,

  data_dir: PathBuf,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, data_dir: PathBuf) -> Result<Self> {
    let store = TaskStore::load(&data_dir);
    let theme = Theme::load(&data_dir);
    let (tx, _rx) = mpsc::unbounded_channel();

    // Cache faults never surface: a broken cache store just disables
    // offline support for this run.
    let (worker, fetcher) = if config.assets.enabled {
      match Self::build_worker(&config, &data_dir) {
        Ok(pair) => pair,
        Err(e) => {
          warn!("offline cache unavailable: {e}");
          (None, None)
        }
      }
    } else {
      (None, None)
    };

    Ok(Self {
      store,
      filter: Filter::All,
      selected: 0,
      mode: Mode::Normal,
      input: TextInput::new(),
      edit: None,
      theme,
      install_hint: false,
      worker,
      fetcher,
      data_dir,
      event_tx: tx,
      should_quit: false,
    })
  }

  fn build_worker(
    config: &Config,
    data_dir: &std::path::Path,
  ) -> Result<(Option<CacheWorker<SqliteStorage>>, Option<HttpFetcher>)> {
    let base = config.asset_base_url()?;
    let storage = SqliteStorage::open(data_dir)?;
    let manifest = CacheManifest::from_config(&config.assets);
    let worker = CacheWorker::new(storage, manifest, base.clone());
    let fetcher = HttpFetcher::new(base);
    Ok((Some(worker), Some(fetcher)))
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    self.check_install_eligibility();

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  /// Offer installation while the active generation lacks the cached shell.
  fn check_install_eligibility(&self) {
    let Some(worker) = self.worker.clone() else {
      return;
    };
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      match worker.shell_cached() {
        Ok(false) => {
          let _ = tx.send(Event::Cache(CacheEvent::InstallEligible));
        }
        Ok(true) => {}
        Err(e) => {
          let _ = tx.send(Event::Error(e.to_string()));
        }
      }
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // UI refresh happens automatically
      Event::Cache(cache_event) => self.handle_cache_event(cache_event),
      Event::Error(msg) => {
        warn!("background task error: {msg}");
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Insert => self.handle_insert_mode_key(key),
      Mode::Edit => self.handle_edit_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      // Quit
      KeyCode::Char('q') => {
        self.should_quit = true;
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),

      // New task input
      KeyCode::Char('a') | KeyCode::Char('i') => {
        self.mode = Mode::Insert;
      }

      // Mutations on the selected row
      KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
      KeyCode::Char('d') => self.remove_selected(),
      KeyCode::Char('e') | KeyCode::Enter => self.start_edit_selected(),
      KeyCode::Char('c') => {
        self.store.clear_completed();
        self.clamp_selection();
      }

      // Filters
      KeyCode::Char('1') => self.set_filter(Filter::All),
      KeyCode::Char('2') => self.set_filter(Filter::Active),
      KeyCode::Char('3') => self.set_filter(Filter::Completed),
      KeyCode::Char('f') => self.set_filter(self.filter.next()),

      // Theme
      KeyCode::Char('t') => {
        self.theme = self.theme.toggle();
        self.theme.save(&self.data_dir);
      }

      // Install prompt
      KeyCode::Char('I') if self.install_hint => self.accept_install(),
      KeyCode::Esc if self.install_hint => {
        // Declined; hide for this session.
        self.install_hint = false;
      }

      _ => {}
    }
  }

  fn handle_insert_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match self.input.handle_key(key) {
      InputResult::Submitted(text) => {
        // Empty input is ignored; either way the line is cleared and
        // keeps focus for the next task.
        self.store.add(&text);
        self.input.clear();
        self.clamp_selection();
      }
      InputResult::Cancelled => {
        self.mode = Mode::Normal;
      }
      InputResult::Consumed | InputResult::NotHandled => {}
    }
  }

  fn handle_edit_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    let Some(session) = self.edit.as_mut() else {
      self.mode = Mode::Normal;
      return;
    };
    match session.input.handle_key(key) {
      InputResult::Submitted(value) => {
        let id = session.id.clone();
        self.store.commit_edit(&id, Some(&value));
        self.edit = None;
        self.mode = Mode::Normal;
      }
      InputResult::Cancelled => {
        let id = session.id.clone();
        self.store.commit_edit(&id, None);
        self.edit = None;
        self.mode = Mode::Normal;
      }
      InputResult::Consumed | InputResult::NotHandled => {}
    }
  }

  fn handle_cache_event(&mut self, event: CacheEvent) {
    match event {
      CacheEvent::InstallEligible => {
        self.install_hint = true;
      }
      CacheEvent::Installed => {
        info!("offline assets installed");
        self.install_hint = false;
      }
      CacheEvent::InstallFailed(msg) => {
        // Keep the hint so the user can retry.
        warn!("offline install failed: {msg}");
      }
    }
  }

  /// Run install + activate on a background task, then smoke-check that
  /// the shell serves with the network refused.
  fn accept_install(&mut self) {
    let (Some(worker), Some(fetcher)) = (self.worker.clone(), self.fetcher.clone()) else {
      self.install_hint = false;
      return;
    };
    self.install_hint = false;
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let fetch = move |path: String| {
        let fetcher = fetcher.clone();
        async move { fetcher.get(&path).await }
      };

      if let Err(e) = worker.install(fetch).await {
        let _ = tx.send(Event::Cache(CacheEvent::InstallFailed(e.to_string())));
        return;
      }
      if let Err(e) = worker.activate() {
        let _ = tx.send(Event::Cache(CacheEvent::InstallFailed(e.to_string())));
        return;
      }

      let root = worker.manifest().root.clone();
      let refused =
        |_path: String| async { Err::<FetchResponse, _>(eyre!("network refused for smoke check")) };
      match worker.fetch(&AssetRequest::navigation(root), refused).await {
        Ok(_) => info!("app shell serves offline"),
        Err(e) => warn!("offline smoke check failed: {e}"),
      }

      let _ = tx.send(Event::Cache(CacheEvent::Installed));
    });
  }

  fn visible_len(&self) -> usize {
    self.store.filtered(self.filter).len()
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.visible_len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn clamp_selection(&mut self) {
    let len = self.visible_len();
    self.selected = self.selected.min(len.saturating_sub(1));
  }

  fn set_filter(&mut self, filter: Filter) {
    self.filter = filter;
    self.clamp_selection();
  }

  fn selected_id(&self) -> Option<String> {
    self
      .store
      .filtered(self.filter)
      .get(self.selected)
      .map(|t| t.id.clone())
  }

  fn toggle_selected(&mut self) {
    if let Some(id) = self.selected_id() {
      self.store.toggle(&id);
      self.clamp_selection();
    }
  }

  fn remove_selected(&mut self) {
    if let Some(id) = self.selected_id() {
      self.store.remove(&id);
      self.clamp_selection();
    }
  }

  fn start_edit_selected(&mut self) {
    let Some(id) = self.selected_id() else {
      return;
    };
    let Some(task) = self.store.get(&id) else {
      return;
    };
    self.edit = Some(EditSession {
      id: id.clone(),
      input: TextInput::with_value(&task.text),
    });
    self.mode = Mode::Edit;
  }

  // Accessors for UI rendering
  pub fn store(&self) -> &TaskStore {
    &self.store
  }

  pub fn filter(&self) -> Filter {
    self.filter
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn input(&self) -> &TextInput {
    &self.input
  }

  pub fn edit(&self) -> Option<&EditSession> {
    self.edit.as_ref()
  }

  pub fn theme(&self) -> Theme {
    self.theme
  }

  pub fn install_hint(&self) -> bool {
    self.install_hint
  }
}
