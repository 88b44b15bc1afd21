//! Theme preference store.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the platform preference.
    #[default]
    System,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(UnknownTheme(s.to_owned())),
        }
    }
}

#[derive(Clone, Default)]
pub struct ThemeStore {
    theme: Arc<Mutex<Theme>>,
}

impl ThemeStore {
    #[must_use]
    pub fn new(initial: Theme) -> Self {
        Self { theme: Arc::new(Mutex::new(initial)) }
    }

    fn lock(&self) -> MutexGuard<'_, Theme> {
        self.theme
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        *self.lock()
    }

    pub fn set_theme(&self, theme: Theme) {
        *self.lock() = theme;
    }

    /// Flip between light and dark. `System` counts as light, so it becomes dark.
    pub fn toggle(&self) -> Theme {
        let mut theme = self.lock();
        *theme = match *theme {
            Theme::Dark => Theme::Light,
            Theme::Light | Theme::System => Theme::Dark,
        };
        *theme
    }

    /// Concrete theme to render with, given the platform preference.
    #[must_use]
    pub fn resolved(&self, prefers_dark: bool) -> Theme {
        match self.theme() {
            Theme::System if prefers_dark => Theme::Dark,
            Theme::System => Theme::Light,
            explicit => explicit,
        }
    }
}
