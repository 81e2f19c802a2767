//! Status definitions: validated codes, finality tagging, and the
//! per-definition transition lists that make up a catalog.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Validated status code referencing a catalog definition.
///
/// Codes are free-form strings supplied by configuration; a code is trimmed
/// and must be non-empty without interior whitespace.
///
/// # Examples
///
/// ```
/// use quorum::task::domain::StatusCode;
///
/// let code = StatusCode::new("INPROGRESS").expect("valid code");
/// assert_eq!(code.as_str(), "INPROGRESS");
/// assert!(StatusCode::new("IN PROGRESS").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(String);

impl StatusCode {
    /// Creates a validated status code.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusCode`] when the trimmed value
    /// is empty or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(TaskDomainError::InvalidStatusCode(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StatusCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for StatusCode {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Sub-classification of terminal statuses.
///
/// `isFinal` alone is not enough for the completion gate: only
/// success-final statuses require every subtask to be settled, while
/// cancel-final statuses terminate a task without completing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalKind {
    /// Terminal status meaning the work completed successfully.
    Success,
    /// Terminal status meaning the work was terminated without completion.
    Cancelled,
}

impl fmt::Display for FinalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success-final"),
            Self::Cancelled => write!(f, "cancel-final"),
        }
    }
}

const fn default_active() -> bool {
    true
}

fn default_color() -> String {
    "#9e9e9e".to_owned()
}

/// One lifecycle status as configured in the catalog document.
///
/// # Examples
///
/// ```
/// use quorum::task::domain::{FinalKind, StatusCode, StatusDefinition};
///
/// let open = StatusCode::new("OPEN").expect("valid code");
/// let done = StatusCode::new("DONE").expect("valid code");
/// let definition = StatusDefinition::new(open, "Open")
///     .as_default()
///     .with_transitions([done])
///     .with_order(1);
/// assert!(definition.is_default());
/// assert!(!definition.is_final());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefinition {
    code: StatusCode,
    label: String,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default)]
    order: u32,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_kind: Option<FinalKind>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    allowed_transitions: BTreeSet<StatusCode>,
}

impl StatusDefinition {
    /// Creates an active, non-terminal definition with no transitions.
    #[must_use]
    pub fn new(code: StatusCode, label: impl Into<String>) -> Self {
        Self {
            code,
            label: label.into(),
            color: default_color(),
            order: 0,
            active: true,
            is_default: false,
            final_kind: None,
            allowed_transitions: BTreeSet::new(),
        }
    }

    /// Sets the display colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Sets the ordering weight used when listing statuses.
    #[must_use]
    pub const fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Replaces the allowed transition targets.
    #[must_use]
    pub fn with_transitions(mut self, targets: impl IntoIterator<Item = StatusCode>) -> Self {
        self.allowed_transitions = targets.into_iter().collect();
        self
    }

    /// Marks this definition as the catalog default for new tasks.
    #[must_use]
    pub const fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Marks this definition as terminal with the given finality.
    #[must_use]
    pub const fn final_as(mut self, kind: FinalKind) -> Self {
        self.final_kind = Some(kind);
        self
    }

    /// Marks this definition as inactive (retired from the catalog).
    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn code(&self) -> &StatusCode {
        &self.code
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the display colour.
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns the ordering weight.
    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Returns true when the definition is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true when this is the catalog default.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the finality tag, if terminal.
    #[must_use]
    pub const fn final_kind(&self) -> Option<FinalKind> {
        self.final_kind
    }

    /// Returns true when the definition is terminal.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.final_kind.is_some()
    }

    /// Returns the configured transition targets.
    #[must_use]
    pub const fn allowed_transitions(&self) -> &BTreeSet<StatusCode> {
        &self.allowed_transitions
    }
}
