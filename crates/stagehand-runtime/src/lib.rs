//! # Stagehand Runtime
//!
//! The core orchestrator. A [`Core`] owns one compiled Appfile graph for
//! the lifetime of a session, resolves every vertex to an implementation
//! through the registry, walks dependencies with fail-fast semantics, and
//! runs the lifecycle tasks: `compile`, `build`, `dev`, and `execute`.
//!
//! The runtime also owns the on-disk session layout ([`Layout`]) and the
//! credential orchestration gating `build`.

mod creds;
mod error;
mod layout;
mod orchestrator;
pub mod test_support;

pub use error::CoreError;
pub use layout::Layout;
pub use orchestrator::{Core, CoreConfig};
