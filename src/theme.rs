//! Theme preference and its terminal palette.
//!
//! The preference is persisted on its own, separate from the task snapshot,
//! and defaults to light when nothing (or garbage) is on disk.

use ratatui::style::Color;
use std::path::Path;
use tracing::warn;

/// File name of the preference inside the data directory.
pub const THEME_FILE: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

/// Colors the UI draws with for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
  pub bg: Color,
  pub fg: Color,
  pub dim: Color,
  pub accent: Color,
  pub done: Color,
}

impl Theme {
  /// Read the persisted preference, defaulting to light.
  pub fn load(data_dir: &Path) -> Self {
    match std::fs::read_to_string(data_dir.join(THEME_FILE)) {
      Ok(raw) => match raw.trim() {
        "dark" => Theme::Dark,
        "light" => Theme::Light,
        other => {
          warn!("unknown theme preference {other:?}, using light");
          Theme::Light
        }
      },
      Err(_) => Theme::Light,
    }
  }

  /// Persist the preference. Failures are logged, never surfaced.
  pub fn save(&self, data_dir: &Path) {
    let raw = match self {
      Theme::Light => "light",
      Theme::Dark => "dark",
    };
    if let Err(e) = std::fs::create_dir_all(data_dir)
      .and_then(|_| std::fs::write(data_dir.join(THEME_FILE), raw))
    {
      warn!("theme preference not persisted: {e}");
    }
  }

  pub fn toggle(self) -> Self {
    match self {
      Theme::Light => Theme::Dark,
      Theme::Dark => Theme::Light,
    }
  }

  /// Footer glyph: shows what pressing the toggle switches to.
  pub fn glyph(&self) -> &'static str {
    match self {
      Theme::Light => "🌙",
      Theme::Dark => "☀",
    }
  }

  pub fn palette(&self) -> Palette {
    match self {
      Theme::Light => Palette {
        bg: Color::White,
        fg: Color::Black,
        dim: Color::DarkGray,
        accent: Color::Blue,
        done: Color::Green,
      },
      Theme::Dark => Palette {
        bg: Color::Black,
        fg: Color::White,
        dim: Color::DarkGray,
        accent: Color::Cyan,
        done: Color::Green,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn test_default_is_light() {
    let dir = tempdir().unwrap();
    assert_eq!(Theme::load(dir.path()), Theme::Light);
  }

  #[test]
  fn test_round_trip() {
    let dir = tempdir().unwrap();
    Theme::Dark.save(dir.path());
    assert_eq!(Theme::load(dir.path()), Theme::Dark);
    Theme::Light.save(dir.path());
    assert_eq!(Theme::load(dir.path()), Theme::Light);
  }

  #[test]
  fn test_garbage_preference_defaults_to_light() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(THEME_FILE), "solarized").unwrap();
    assert_eq!(Theme::load(dir.path()), Theme::Light);
  }

  #[test]
  fn test_toggle_flips() {
    assert_eq!(Theme::Light.toggle(), Theme::Dark);
    assert_eq!(Theme::Dark.toggle(), Theme::Light);
  }
}
