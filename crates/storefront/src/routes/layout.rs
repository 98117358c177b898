//! Shared page chrome: navigation user, toast, theme.

use crate::middleware::{CurrentSession, Preferences};
use crate::models::{SessionUser, Theme};

/// Data every full page needs for `base.html`.
pub struct LayoutContext {
    pub user: Option<SessionUser>,
    pub toast: Option<String>,
    pub theme: Theme,
    /// Path of the current page, used as the theme toggle's return target.
    pub path: String,
}

impl LayoutContext {
    /// Build the layout for a page render. Consumes the pending toast.
    pub fn new(session: &mut CurrentSession, preferences: Preferences, path: &str) -> Self {
        Self {
            user: session.user().map(|auth| auth.user.clone()),
            toast: session.take_toast(),
            theme: preferences.theme,
            path: path.to_string(),
        }
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// First name for the navigation greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|user| user.name.split_whitespace().next())
            .unwrap_or("")
    }
}
