use chrono::{DateTime, Utc};

/// Custom actions for Tree entities.
#[derive(Debug, Clone)]
pub enum TreeAction {
    /// Takes the tree out of the orchard as of the given instant.
    ///
    /// # Errors
    /// Fails if the tree was already removed.
    Remove { at: DateTime<Utc> },
}

/// Results from TreeActions - variants match 1:1 with TreeAction
#[derive(Debug, Clone, PartialEq)]
pub enum TreeActionResult {
    Remove(DateTime<Utc>),
}
