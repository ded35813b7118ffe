use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const DEFAULT_ACCENT_TEXT: &str = "#ffffff";
const DEFAULT_BACKGROUND: &str = "#f8fafc";

/// Theme parameters as supplied by the chat mini-app host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThemeParams {
    pub bg_color: Option<String>,
    pub button_color: Option<String>,
    pub button_text_color: Option<String>,
    pub secondary_bg_color: Option<String>,
    pub hint_color: Option<String>,
    pub text_color: Option<String>,
    /// Anything else the host sends.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    pub accent_text: Option<String>,
    pub accent: Option<String>,
    pub background: Option<String>,
}

impl Theme {
    pub fn from_params(params: &ThemeParams) -> Self {
        Self {
            accent_text: colour(&params.button_text_color),
            accent: colour(&params.button_color),
            background: colour(&params.bg_color),
        }
    }

    /// Resolve a theme from a possibly-absent host payload, falling back to
    /// `current` when the host sends nothing (e.g. a bare `themeChanged`).
    pub fn resolve(update: Option<&ThemeParams>, current: Option<&ThemeParams>) -> Option<Self> {
        update.or(current).map(Self::from_params)
    }

    /// CSS custom properties for the accent palette. Empty without an accent.
    pub fn accent_style(&self) -> Vec<(&'static str, String)> {
        let Some(accent) = &self.accent else {
            return Vec::new();
        };
        vec![
            ("--accent-color", accent.clone()),
            (
                "--accent-text-color",
                self.accent_text
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ACCENT_TEXT.to_owned()),
            ),
            (
                "--background-color",
                self.background
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BACKGROUND.to_owned()),
            ),
        ]
    }
}

fn colour(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_owned)
}
