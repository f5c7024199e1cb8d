//! Tagged wire values and the reference handle type.

use std::ffi::{c_void, CString};
use std::fmt;

/// Which runtime owns a proxied object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// The object lives in the embedded script runtime.
    Embedded,
    /// The object lives in the host runtime.
    Host,
}

impl RefKind {
    /// The tag string the proxy registry uses for this owner side.
    pub fn tag(self) -> &'static str {
        match self {
            RefKind::Embedded => "embedded",
            RefKind::Host => "host",
        }
    }

    /// Parse an owner tag. Returns `None` for anything but the two
    /// recognized tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "embedded" => Some(RefKind::Embedded),
            "host" => Some(RefKind::Host),
            _ => None,
        }
    }
}

/// An opaque integer identifying a foreign-owned object registered with the
/// proxy registry. Handles carry no arithmetic meaning and no stability
/// guarantee; only the registry mints or retires them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(i64);

impl Handle {
    /// The zero handle, returned alongside lookup errors.
    pub const NULL: Handle = Handle(0);

    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// A string crossing the boundary.
///
/// `Owned` carries a freshly allocated null-terminated buffer whose ownership
/// moves with the value; the receiver releases it exactly once by dropping
/// it. `Interned` is an index into a caller-owned [`StringTable`] and borrows
/// nothing.
///
/// [`StringTable`]: crate::table::StringTable
#[derive(Debug, PartialEq, Eq)]
pub enum WireStr {
    Owned(CString),
    Interned(u32),
}

/// An opaque untyped pointer. Round-trips by identity; the bridge never
/// dereferences it and attaches no destructor or type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capsule(pub *mut c_void);

/// One tagged value crossing the runtime boundary.
#[derive(Debug, PartialEq)]
pub enum WireValue {
    None,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Real(f64),
    Str(WireStr),
    Ptr(Capsule),
    /// Handle to an object owned by the embedded runtime.
    EmbeddedRef(Handle),
    /// Handle to an object owned by the host runtime.
    HostRef(Handle),
}

impl WireValue {
    /// Encode an integer, promoting to `Int64` only when it does not fit a
    /// signed 32-bit range.
    pub fn from_int(n: i64) -> WireValue {
        match i32::try_from(n) {
            Ok(v) => WireValue::Int32(v),
            Err(_) => WireValue::Int64(n),
        }
    }

    /// Reference handle and owner side, if this is a reference value.
    pub fn as_ref_handle(&self) -> Option<(RefKind, Handle)> {
        match self {
            WireValue::EmbeddedRef(h) => Some((RefKind::Embedded, *h)),
            WireValue::HostRef(h) => Some((RefKind::Host, *h)),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::None => "none",
            WireValue::Bool(_) => "bool",
            WireValue::Int32(_) => "int32",
            WireValue::Int64(_) => "int64",
            WireValue::Real(_) => "real",
            WireValue::Str(_) => "string",
            WireValue::Ptr(_) => "pointer",
            WireValue::EmbeddedRef(_) => "embedded-ref",
            WireValue::HostRef(_) => "host-ref",
        }
    }
}
