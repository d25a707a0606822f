//! Browser bindings for `phaseplane_core`.
//!
//! The front end owns drawing and input; this crate keeps the portrait state
//! and hands back plain arrays or serde-encoded values for rendering.

mod portrait;
mod system;

pub use portrait::WasmPhasePlane;
