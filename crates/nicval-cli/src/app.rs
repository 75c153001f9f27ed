//! Dashboard state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use nicval_core::{record::ValidationRecord, stats::Summary};

use crate::client::{ApiClient, RecordFilter};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the record list; right pane previews the record under the
  /// cursor.
  RecordList,
  /// Focus on the record detail pane.
  RecordDetail,
  /// Birth-month and eligibility charts.
  Charts,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level dashboard state.
pub struct App {
  pub screen: Screen,

  /// Every record the server returned, most recently seen first.
  pub records: Vec<ValidationRecord>,

  /// Aggregates for the charts screen.
  pub summary: Option<Summary>,

  /// Current fuzzy-filter string (only edited while `filter_active`).
  pub filter: String,

  pub filter_active: bool,

  /// Cursor position within the *filtered* record list.
  pub list_cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient) -> Self {
    Self {
      screen: Screen::RecordList,
      records: Vec::new(),
      summary: None,
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch records and the summary from the API.
  pub async fn load(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading records…".into();
    let loaded = async {
      let records = self.client.list_records(&RecordFilter::default()).await?;
      let summary = self.client.stats().await?;
      anyhow::Ok((records, summary))
    }
    .await;

    match loaded {
      Ok((records, summary)) => {
        self.records = records;
        self.summary = Some(summary);
        self.list_cursor = 0;
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Records whose identifier, status or city match the filter.
  pub fn filtered_records(&self) -> Vec<&ValidationRecord> {
    if self.filter.is_empty() {
      return self.records.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .records
      .iter()
      .filter(|r| {
        let city = r
          .location
          .as_ref()
          .and_then(|l| l.city.as_deref())
          .unwrap_or_default();
        let status = if r.status.is_valid() { "valid" } else { "invalid" };
        matcher.fuzzy_match(&r.nic, &self.filter).is_some()
          || matcher.fuzzy_match(city, &self.filter).is_some()
          || status == self.filter
      })
      .collect()
  }

  /// The record under the list cursor in the filtered view, if any.
  pub fn cursor_record(&self) -> Option<&ValidationRecord> {
    self.filtered_records().get(self.list_cursor).copied()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }

    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Tab => {
        self.screen = match self.screen {
          Screen::Charts => Screen::RecordList,
          _ => Screen::Charts,
        };
        return Ok(true);
      }
      KeyCode::Char('r') => {
        // A failed reload leaves the error in the status bar.
        let _ = self.load().await;
        return Ok(true);
      }
      _ => {}
    }

    match self.screen {
      Screen::RecordList => self.handle_list_key(key),
      Screen::RecordDetail => self.handle_detail_key(key),
      Screen::Charts => {}
    }
    Ok(true)
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        if self.filtered_records().len() == 1 {
          self.screen = Screen::RecordDetail;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  fn move_cursor(&mut self, down: bool) {
    let len = self.filtered_records().len();
    if down {
      if self.list_cursor + 1 < len {
        self.list_cursor += 1;
      }
    } else {
      self.list_cursor = self.list_cursor.saturating_sub(1);
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
      KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if self.cursor_record().is_some() {
          self.screen = Screen::RecordDetail;
        }
      }
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::RecordList;
      }
      KeyCode::Char(']') | KeyCode::PageDown | KeyCode::Down => {
        self.move_cursor(true)
      }
      KeyCode::Char('[') | KeyCode::PageUp | KeyCode::Up => {
        self.move_cursor(false)
      }
      _ => {}
    }
  }
}
