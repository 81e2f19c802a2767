//! Identity provider adapter returning a fixed actor.

use crate::task::{domain::Actor, ports::IdentityProvider};

/// Identity provider that always reports the same actor.
///
/// Useful for tests and single-principal embeddings.
#[derive(Debug, Clone)]
pub struct FixedIdentityProvider {
    actor: Actor,
}

impl FixedIdentityProvider {
    /// Creates a provider reporting the given actor.
    #[must_use]
    pub const fn new(actor: Actor) -> Self {
        Self { actor }
    }
}

impl IdentityProvider for FixedIdentityProvider {
    fn current_actor(&self) -> Actor {
        self.actor.clone()
    }
}
