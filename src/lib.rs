//! Match-3 (workspace facade crate).
//!
//! Re-exports the workspace crates as `match3::{types,core,adapter}` so tests,
//! benchmarks and the server binary share one import path while the
//! implementation lives in dedicated crates under `crates/`.

pub use match3_adapter as adapter;
pub use match3_core as core;
pub use match3_types as types;
