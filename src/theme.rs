use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::host::ThemeParameters;

/// (host role, display variable, built-in default)
pub const THEME_ROLES: [(&str, &str, &str); 6] = [
    ("bg_color", "--tg-theme-bg-color", "#ffffff"),
    ("text_color", "--tg-theme-text-color", "#000000"),
    ("hint_color", "--tg-theme-hint-color", "#999999"),
    ("link_color", "--tg-theme-link-color", "#2481cc"),
    ("button_color", "--tg-theme-button-color", "#2481cc"),
    ("button_text_color", "--tg-theme-button-text-color", "#ffffff"),
];

/// where display variables end up (document root style, webview, test recorder)
pub trait DisplaySurface: Send + Sync {
    fn set_variable(&self, name: &str, value: &str) -> Result<(), String>;
}

/// in-memory surface that can be rendered into a `:root` css block
#[derive(Debug, Default)]
pub struct CssVariables {
    values: std::sync::Mutex<BTreeMap<String, String>>,
}

impl CssVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(name).cloned())
    }

    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        if let Ok(values) = self.values.lock() {
            for (name, value) in values.iter() {
                let _ = writeln!(css, "  {}: {};", name, value);
            }
        }
        css.push('}');
        css
    }
}

impl DisplaySurface for CssVariables {
    fn set_variable(&self, name: &str, value: &str) -> Result<(), String> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| "css variable store poisoned".to_string())?;
        values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

pub struct ThemeApplier;

impl ThemeApplier {
    /// sets all six display variables; surface failures are logged and skipped
    pub fn apply(surface: &dyn DisplaySurface, theme: &ThemeParameters) {
        for (role, variable, default) in THEME_ROLES {
            let value = theme.get(role).unwrap_or(default);
            if let Err(e) = surface.set_variable(variable, value) {
                warn!("Failed to set display variable {}: {}", variable, e);
            }
        }
        if theme.is_empty() {
            debug!("Host declared no theme, built-in defaults applied");
        } else {
            debug!("Applied host theme ({} declared values)", theme.len());
        }
    }
}
