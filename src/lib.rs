//! Starname - a hierarchical domain and account name registry
//!
//! This is the root crate that provides workspace-level documentation.
//! The implementation lives in `starname-core`, re-exported here.

pub use starname_core::*;

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
