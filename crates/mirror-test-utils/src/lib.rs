//! Shared test utilities for the folder-mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`] — [`TestTree`](tree::TestTree) builder for source/replica fixtures

pub mod tree;

pub use tree::{TestTree, is_root};
