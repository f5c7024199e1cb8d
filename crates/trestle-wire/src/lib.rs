//! Wire protocol for the Trestle bridge.
//!
//! A [`WireValue`] is the tagged representation of one piece of data crossing
//! the boundary between the host runtime and the embedded script runtime.
//! Values are transient: created at a marshal point, consumed at the first
//! unmarshal point, never persisted beyond a single call. The one documented
//! exception is [`WireStr::Owned`], whose heap buffer transfers to the
//! receiver and is released exactly once when dropped.

pub mod table;
pub mod value;

pub use table::StringTable;
pub use value::{Capsule, Handle, RefKind, WireStr, WireValue};

/// Upper bound on wire values carried by a single call (arguments or
/// results). Exceeding it is a caller error surfaced as a capacity error,
/// never a silent truncation.
pub const MAX_CALL_VALUES: usize = 256;
