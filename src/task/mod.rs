//! Task lifecycle and approval consensus engine.
//!
//! Tasks move through a configurable status catalog under a permission
//! guard and a completion gate; approval tasks resolve approver votes into
//! terminal transitions; every applied change is appended to an audit
//! trail. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
