//! Task collection and its persisted snapshot.
//!
//! The in-memory collection is the single source of truth; the snapshot on
//! disk is a whole-file JSON overwrite performed after every mutation.
//! Loading never fails: a missing or unparseable snapshot degrades to an
//! empty collection.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name of the snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "tasks.json";

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub text: String,
  pub done: bool,
}

/// View selector restricting displayed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
  #[default]
  All,
  Active,
  Completed,
}

impl Filter {
  pub fn matches(&self, task: &Task) -> bool {
    match self {
      Filter::All => true,
      Filter::Active => !task.done,
      Filter::Completed => task.done,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Filter::All => "Todas",
      Filter::Active => "Activas",
      Filter::Completed => "Completadas",
    }
  }

  /// Cycle order used by the `f` key.
  pub fn next(self) -> Self {
    match self {
      Filter::All => Filter::Active,
      Filter::Active => Filter::Completed,
      Filter::Completed => Filter::All,
    }
  }
}

/// Ordered task collection, newest first, backed by a JSON snapshot.
pub struct TaskStore {
  tasks: Vec<Task>,
  path: PathBuf,
}

impl TaskStore {
  /// Load the snapshot from the data directory.
  ///
  /// Absence or a parse failure yields an empty collection, never an error.
  pub fn load(data_dir: &Path) -> Self {
    let path = data_dir.join(SNAPSHOT_FILE);
    let tasks = match std::fs::read_to_string(&path) {
      Ok(raw) => match serde_json::from_str(&raw) {
        Ok(tasks) => tasks,
        Err(e) => {
          warn!("unreadable task snapshot at {}: {}", path.display(), e);
          Vec::new()
        }
      },
      Err(_) => Vec::new(),
    };
    Self { tasks, path }
  }

  /// Serialize the whole collection and overwrite the snapshot.
  fn save(&self) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
    }
    let raw = serde_json::to_string(&self.tasks)?;
    std::fs::write(&self.path, raw)
      .map_err(|e| eyre!("Failed to write {}: {}", self.path.display(), e))?;
    Ok(())
  }

  /// Persist after a mutation. Write failures are logged, never surfaced.
  fn persist(&self) {
    if let Err(e) = self.save() {
      warn!("task snapshot not persisted: {e}");
    }
  }

  /// Millisecond-clock id, bumped until unique within the collection.
  fn fresh_id(&self) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
      let id = millis.to_string();
      if !self.tasks.iter().any(|t| t.id == id) {
        return id;
      }
      millis += 1;
    }
  }

  /// Add a task with the trimmed text, prepended (newest first).
  ///
  /// Empty or whitespace-only input is a no-op with no snapshot write.
  /// Returns whether a task was added.
  pub fn add(&mut self, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
      return false;
    }
    let task = Task {
      id: self.fresh_id(),
      text: text.to_string(),
      done: false,
    };
    self.tasks.insert(0, task);
    self.persist();
    true
  }

  /// Flip the `done` flag of the matching task. Unknown ids are a no-op.
  pub fn toggle(&mut self, id: &str) -> bool {
    match self.tasks.iter_mut().find(|t| t.id == id) {
      Some(task) => {
        task.done = !task.done;
        self.persist();
        true
      }
      None => false,
    }
  }

  /// Delete the matching task. Unknown ids are a no-op.
  pub fn remove(&mut self, id: &str) -> bool {
    let before = self.tasks.len();
    self.tasks.retain(|t| t.id != id);
    if self.tasks.len() != before {
      self.persist();
      true
    } else {
      false
    }
  }

  /// End an edit session.
  ///
  /// `Some(value)` commits: the trimmed value replaces the text only if
  /// non-empty, otherwise the original text stays. `None` cancels. Both
  /// outcomes persist the snapshot.
  pub fn commit_edit(&mut self, id: &str, value: Option<&str>) {
    if let Some(value) = value {
      let value = value.trim();
      if !value.is_empty() {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
          task.text = value.to_string();
        }
      }
    }
    self.persist();
  }

  /// Remove every completed task in one operation.
  pub fn clear_completed(&mut self) {
    self.tasks.retain(|t| !t.done);
    self.persist();
  }

  /// Visible subset for a filter, in collection order.
  pub fn filtered(&self, filter: Filter) -> Vec<&Task> {
    self.tasks.iter().filter(|t| filter.matches(t)).collect()
  }

  /// Count of not-done tasks, independent of the active filter.
  pub fn remaining(&self) -> usize {
    self.tasks.iter().filter(|t| !t.done).count()
  }

  /// Remaining-count label with singular/plural wording.
  pub fn remaining_label(&self) -> String {
    let left = self.remaining();
    if left == 1 {
      format!("{} pendiente", left)
    } else {
      format!("{} pendientes", left)
    }
  }

  pub fn get(&self, id: &str) -> Option<&Task> {
    self.tasks.iter().find(|t| t.id == id)
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn store_in(dir: &Path) -> TaskStore {
    TaskStore::load(dir)
  }

  #[test]
  fn test_add_trims_input() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    assert!(store.add("  Buy milk  "));
    assert_eq!(store.tasks()[0].text, "Buy milk");
    assert!(!store.tasks()[0].done);
  }

  #[test]
  fn test_add_empty_is_noop_without_write() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    assert!(!store.add(""));
    assert!(!store.add("   "));
    assert!(store.tasks().is_empty());
    // No mutation happened, so no snapshot was written.
    assert!(!dir.path().join(SNAPSHOT_FILE).exists());
  }

  #[test]
  fn test_newest_first_order() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("first");
    store.add("second");
    let texts: Vec<_> = store.tasks().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["second", "first"]);
  }

  #[test]
  fn test_ids_are_unique() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    for i in 0..10 {
      store.add(&format!("task {i}"));
    }
    let mut ids: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
  }

  #[test]
  fn test_snapshot_round_trip() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("a");
    store.add("b");
    let id = store.tasks()[0].id.clone();
    store.toggle(&id);

    let reloaded = store_in(dir.path());
    assert_eq!(reloaded.tasks(), store.tasks());
  }

  #[test]
  fn test_corrupt_snapshot_degrades_to_empty() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(SNAPSHOT_FILE), "not json").unwrap();
    let store = store_in(dir.path());
    assert!(store.tasks().is_empty());
  }

  #[test]
  fn test_toggle_unknown_id_changes_nothing() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("a");
    let before = store.tasks().to_vec();
    assert!(!store.toggle("nope"));
    assert_eq!(store.tasks(), before.as_slice());

    let reloaded = store_in(dir.path());
    assert_eq!(reloaded.tasks(), before.as_slice());
  }

  #[test]
  fn test_remove_unknown_id_is_noop() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("a");
    assert!(!store.remove("nope"));
    assert_eq!(store.tasks().len(), 1);
  }

  #[test]
  fn test_filters() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    // Insert in reverse so the collection reads A, B, C.
    store.add("C");
    store.add("B");
    store.add("A");
    let b_id = store.get_by_text("B");
    store.toggle(&b_id);

    let texts = |f: Filter| -> Vec<String> {
      store.filtered(f).iter().map(|t| t.text.clone()).collect()
    };
    assert_eq!(texts(Filter::Active), vec!["A", "C"]);
    assert_eq!(texts(Filter::Completed), vec!["B"]);
    assert_eq!(texts(Filter::All), vec!["A", "B", "C"]);
    assert_eq!(store.remaining_label(), "2 pendientes");
  }

  #[test]
  fn test_remaining_label_singular_plural() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    assert_eq!(store.remaining_label(), "0 pendientes");
    store.add("a");
    assert_eq!(store.remaining_label(), "1 pendiente");
    store.add("b");
    assert_eq!(store.remaining_label(), "2 pendientes");
  }

  #[test]
  fn test_clear_completed() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("C");
    store.add("B");
    store.add("A");
    store.toggle(&store.get_by_text("B"));
    store.toggle(&store.get_by_text("C"));
    store.clear_completed();

    let texts: Vec<_> = store.tasks().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["A"]);

    let reloaded = store_in(dir.path());
    assert_eq!(reloaded.tasks(), store.tasks());
  }

  #[test]
  fn test_edit_commit_replaces_text() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("old");
    let id = store.tasks()[0].id.clone();
    store.commit_edit(&id, Some("  new  "));
    assert_eq!(store.tasks()[0].text, "new");
  }

  #[test]
  fn test_edit_empty_keeps_original() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("original");
    let id = store.tasks()[0].id.clone();
    store.commit_edit(&id, Some("   "));
    assert_eq!(store.tasks()[0].text, "original");

    let reloaded = store_in(dir.path());
    assert_eq!(reloaded.tasks()[0].text, "original");
  }

  #[test]
  fn test_edit_cancel_keeps_original() {
    let dir = tempdir().unwrap();
    let mut store = store_in(dir.path());
    store.add("original");
    let id = store.tasks()[0].id.clone();
    store.commit_edit(&id, None);
    assert_eq!(store.tasks()[0].text, "original");
  }

  impl TaskStore {
    fn get_by_text(&self, text: &str) -> String {
      self
        .tasks
        .iter()
        .find(|t| t.text == text)
        .map(|t| t.id.clone())
        .unwrap()
    }
  }
}
