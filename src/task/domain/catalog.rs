//! Status catalog: the validated set of lifecycle definitions and the
//! transition graph between them.
//!
//! A catalog is loaded once from configuration, validated at construction,
//! and shared immutably for the life of the process. Swapping a catalog
//! means building a new one and replacing the shared handle; definitions are
//! never mutated in place, so a transition in flight always sees one
//! consistent graph.

use super::{FinalKind, StatusCode, StatusDefinition};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors raised while validating a catalog configuration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configuration contains no definitions.
    #[error("a status catalog requires at least one definition")]
    Empty,

    /// Two definitions share the same code.
    #[error("duplicate status code '{0}'")]
    DuplicateCode(StatusCode),

    /// No active definition is marked as the default.
    #[error("no active status definition is marked as default")]
    NoDefault,

    /// More than one active definition is marked as the default.
    #[error("statuses '{0}' and '{1}' are both marked as default")]
    MultipleDefaults(StatusCode, StatusCode),

    /// The default definition is terminal, which would create tasks that can
    /// never leave their initial state.
    #[error("default status '{0}' must not be terminal")]
    FinalDefault(StatusCode),

    /// A transition references the definition's own code.
    #[error("status '{0}' may not list itself as a transition target")]
    SelfLoop(StatusCode),

    /// A transition references a code with no definition.
    #[error("status '{from}' lists unknown transition target '{to}'")]
    UnknownTransitionTarget {
        /// Source definition code.
        from: StatusCode,
        /// Missing target code.
        to: StatusCode,
    },

    /// A transition references an inactive definition.
    #[error("status '{from}' lists inactive transition target '{to}'")]
    InactiveTransitionTarget {
        /// Source definition code.
        from: StatusCode,
        /// Retired target code.
        to: StatusCode,
    },

    /// A terminal definition lists outgoing transitions.
    #[error("terminal status '{0}' must not list outgoing transitions")]
    FinalWithTransitions(StatusCode),

    /// The configuration document could not be parsed.
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable, validated lookup over status definitions.
///
/// # Examples
///
/// ```
/// use quorum::task::domain::{FinalKind, StatusCatalog, StatusCode, StatusDefinition};
///
/// let open = StatusCode::new("OPEN").expect("valid code");
/// let done = StatusCode::new("DONE").expect("valid code");
/// let catalog = StatusCatalog::new(vec![
///     StatusDefinition::new(open.clone(), "Open")
///         .as_default()
///         .with_transitions([done.clone()]),
///     StatusDefinition::new(done.clone(), "Done").final_as(FinalKind::Success),
/// ])
/// .expect("valid catalog");
///
/// assert!(catalog.valid_targets(&open).contains(&done));
/// assert!(catalog.valid_targets(&done).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    definitions: BTreeMap<StatusCode, StatusDefinition>,
    default_code: StatusCode,
}

impl StatusCatalog {
    /// Builds a catalog from configured definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the configuration violates a catalog
    /// invariant: duplicate codes, zero or multiple active defaults, a
    /// terminal default, transitions referencing unknown/inactive/self
    /// targets, or a terminal definition with outgoing transitions.
    pub fn new(definitions: Vec<StatusDefinition>) -> Result<Self, CatalogError> {
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut by_code: BTreeMap<StatusCode, StatusDefinition> = BTreeMap::new();
        for definition in definitions {
            let code = definition.code().clone();
            if by_code.insert(code.clone(), definition).is_some() {
                return Err(CatalogError::DuplicateCode(code));
            }
        }

        let default_code = Self::resolve_default(&by_code)?;
        Self::check_transitions(&by_code)?;

        Ok(Self {
            definitions: by_code,
            default_code,
        })
    }

    /// Loads and validates a catalog from a JSON configuration document
    /// (an array of status definitions).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] when the document is malformed, or
    /// any other [`CatalogError`] when the parsed definitions violate a
    /// catalog invariant.
    pub fn from_json(document: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<StatusDefinition> = serde_json::from_str(document)?;
        Self::new(definitions)
    }

    fn resolve_default(
        by_code: &BTreeMap<StatusCode, StatusDefinition>,
    ) -> Result<StatusCode, CatalogError> {
        let mut default_code: Option<StatusCode> = None;
        for definition in by_code.values() {
            if !(definition.is_active() && definition.is_default()) {
                continue;
            }
            if let Some(existing) = &default_code {
                return Err(CatalogError::MultipleDefaults(
                    existing.clone(),
                    definition.code().clone(),
                ));
            }
            default_code = Some(definition.code().clone());
        }
        let resolved = default_code.ok_or(CatalogError::NoDefault)?;
        let is_final_default = by_code
            .get(&resolved)
            .is_some_and(StatusDefinition::is_final);
        if is_final_default {
            return Err(CatalogError::FinalDefault(resolved));
        }
        Ok(resolved)
    }

    fn check_transitions(
        by_code: &BTreeMap<StatusCode, StatusDefinition>,
    ) -> Result<(), CatalogError> {
        for definition in by_code.values() {
            if definition.is_final() && !definition.allowed_transitions().is_empty() {
                return Err(CatalogError::FinalWithTransitions(definition.code().clone()));
            }
            for target in definition.allowed_transitions() {
                if target == definition.code() {
                    return Err(CatalogError::SelfLoop(target.clone()));
                }
                let Some(target_definition) = by_code.get(target) else {
                    return Err(CatalogError::UnknownTransitionTarget {
                        from: definition.code().clone(),
                        to: target.clone(),
                    });
                };
                if !target_definition.is_active() {
                    return Err(CatalogError::InactiveTransitionTarget {
                        from: definition.code().clone(),
                        to: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the definition for a code, active or not.
    #[must_use]
    pub fn definition(&self, code: &StatusCode) -> Option<&StatusDefinition> {
        self.definitions.get(code)
    }

    /// Returns the active definition for a code.
    #[must_use]
    pub fn active_definition(&self, code: &StatusCode) -> Option<&StatusDefinition> {
        self.definitions
            .get(code)
            .filter(|definition| definition.is_active())
    }

    /// Returns the default status code assigned to new tasks.
    #[must_use]
    pub const fn default_code(&self) -> &StatusCode {
        &self.default_code
    }

    /// Returns the legal transition targets out of `from`.
    ///
    /// Fails closed: an unknown or inactive `from` code yields an empty
    /// set, and targets are filtered to active definitions.
    #[must_use]
    pub fn valid_targets(&self, from: &StatusCode) -> BTreeSet<StatusCode> {
        self.active_definition(from).map_or_else(BTreeSet::new, |definition| {
            definition
                .allowed_transitions()
                .iter()
                .filter(|target| self.active_definition(target).is_some())
                .cloned()
                .collect()
        })
    }

    /// Returns true when the code names an active terminal definition.
    #[must_use]
    pub fn is_final(&self, code: &StatusCode) -> bool {
        self.active_definition(code)
            .is_some_and(StatusDefinition::is_final)
    }

    /// Returns true when the code names an active success-final definition.
    #[must_use]
    pub fn is_success_final(&self, code: &StatusCode) -> bool {
        self.final_kind_of(code) == Some(FinalKind::Success)
    }

    /// Returns true when the code names an active cancel-final definition.
    #[must_use]
    pub fn is_cancel_final(&self, code: &StatusCode) -> bool {
        self.final_kind_of(code) == Some(FinalKind::Cancelled)
    }

    /// Returns the finality tag of an active definition, if any.
    #[must_use]
    pub fn final_kind_of(&self, code: &StatusCode) -> Option<FinalKind> {
        self.active_definition(code)
            .and_then(StatusDefinition::final_kind)
    }

    /// Returns the display label for a code, falling back to the raw code
    /// for definitions the catalog does not know.
    #[must_use]
    pub fn label_of(&self, code: &StatusCode) -> String {
        self.definitions
            .get(code)
            .map_or_else(|| code.as_str().to_owned(), |definition| {
                definition.label().to_owned()
            })
    }

    /// Returns the active terminal status consensus resolutions use for the
    /// given finality, preferring the lowest `order`.
    #[must_use]
    pub fn first_final(&self, kind: FinalKind) -> Option<StatusCode> {
        self.definitions
            .values()
            .filter(|definition| {
                definition.is_active() && definition.final_kind() == Some(kind)
            })
            .min_by_key(|definition| definition.order())
            .map(|definition| definition.code().clone())
    }

    /// Returns every active definition ordered by `order`, then code.
    #[must_use]
    pub fn active_definitions(&self) -> Vec<&StatusDefinition> {
        let mut active: Vec<&StatusDefinition> = self
            .definitions
            .values()
            .filter(|definition| definition.is_active())
            .collect();
        active.sort_by_key(|definition| (definition.order(), definition.code().clone()));
        active
    }
}
