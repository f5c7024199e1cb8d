//! Script runtime boundary for the Trestle bridge.
//!
//! This crate defines the surface the bridge sees of the embedded,
//! dynamically-typed script runtime: the [`ScriptValue`] tagged value, the
//! [`Interp`] module registry and call entry, and the [`ScriptError`] fault
//! diagnostic. Interpreter internals beyond this boundary (parsing, search
//! paths, shutdown) are the embedding's concern.

pub mod error;
pub mod interp;
pub mod value;

pub use error::ScriptError;
pub use interp::{Interp, Module};
pub use value::{ScriptFn, ScriptObject, ScriptValue};
