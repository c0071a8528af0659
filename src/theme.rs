// Custom Connections – A word grouping game
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

/// Local storage key for the theme choice
pub const STORAGE_KEY: &'static str = "darkMode";

/// Class added to the root elements when the dark theme is used
pub const DARK_CLASS: &'static str = "dark";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Picks the theme from the stored choice if there is one, then
    /// from the preference reported by the system.
    pub fn resolve(stored: Option<&str>, prefers_dark: Option<bool>) -> Theme {
        if let Some(theme) = stored.and_then(Theme::from_storage_value) {
            theme
        } else {
            match prefers_dark {
                Some(true) => Theme::Dark,
                Some(false) | None => Theme::default(),
            }
        }
    }

    pub fn from_storage_value(value: &str) -> Option<Theme> {
        match value {
            "true" => Some(Theme::Dark),
            "false" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn storage_value(self) -> &'static str {
        match self {
            Theme::Dark => "true",
            Theme::Light => "false",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// Label for the button that switches to the other theme
    pub fn toggle_label(self) -> &'static str {
        match self {
            Theme::Dark => "☀️ Light mode",
            Theme::Light => "🌙 Dark mode",
        }
    }
}
