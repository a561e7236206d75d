/// Custom actions for AppleVariety entities.
#[derive(Debug, Clone)]
pub enum VarietyAction {
    /// Flips whether the variety can be ordered.
    ToggleActive,
}

/// Results from VarietyActions - variants match 1:1 with VarietyAction
#[derive(Debug, Clone, PartialEq)]
pub enum VarietyActionResult {
    /// The active flag after the toggle
    ToggleActive(bool),
}
