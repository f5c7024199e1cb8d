//! Per-value conversion between script values and tagged wire values.

use std::ffi::CString;

use trestle_script::{Interp, ScriptValue};
use trestle_wire::{Capsule, RefKind, StringTable, WireStr, WireValue};

use crate::error::{BridgeError, BridgeResult};
use crate::proxy::BridgeFns;

/// One call's view of the conversion machinery.
///
/// Borrowed per call rather than held globally, so a nested cross-runtime
/// call builds its own codec over the same interpreter without sharing any
/// in-flight conversion state.
pub struct Codec<'a> {
    interp: &'a mut Interp,
    funcs: &'a BridgeFns,
}

impl<'a> Codec<'a> {
    pub fn new(interp: &'a mut Interp, funcs: &'a BridgeFns) -> Self {
        Self { interp, funcs }
    }

    /// Encode one script value as a wire value.
    ///
    /// Scalars and capsules map directly; any other value is foreign and
    /// goes through the proxy registry, which decides which side owns it.
    pub fn to_wire(&mut self, v: &ScriptValue) -> BridgeResult<WireValue> {
        match v {
            ScriptValue::None => Ok(WireValue::None),
            // Bool is a distinct wire kind, checked before numeric encoding.
            ScriptValue::Bool(b) => Ok(WireValue::Bool(*b)),
            ScriptValue::Int(n) => Ok(WireValue::from_int(*n)),
            ScriptValue::Float(x) => Ok(WireValue::Real(*x)),
            ScriptValue::Str(s) => {
                // Fresh owned buffer; ownership transfers to the receiver.
                let buf = CString::new(s.as_bytes()).map_err(|_| BridgeError::NulInString)?;
                Ok(WireValue::Str(WireStr::Owned(buf)))
            }
            ScriptValue::Capsule(p) => Ok(WireValue::Ptr(Capsule(*p))),
            foreign => {
                let (kind, handle) = self.funcs.proxy(self.interp, foreign.clone())?;
                Ok(match kind {
                    RefKind::Embedded => WireValue::EmbeddedRef(handle),
                    RefKind::Host => WireValue::HostRef(handle),
                })
            }
        }
    }

    /// Decode one wire value, consuming it. Owned string buffers are
    /// released here, after their content is copied into the script runtime.
    pub fn from_wire(
        &mut self,
        v: WireValue,
        table: Option<&StringTable<'_>>,
    ) -> BridgeResult<ScriptValue> {
        match v {
            WireValue::None => Ok(ScriptValue::None),
            WireValue::Bool(b) => Ok(ScriptValue::Bool(b)),
            WireValue::Int32(n) => Ok(ScriptValue::Int(n as i64)),
            WireValue::Int64(n) => Ok(ScriptValue::Int(n)),
            WireValue::Real(x) => Ok(ScriptValue::Float(x)),
            WireValue::Str(WireStr::Owned(buf)) => {
                let s = buf.to_str().map_err(|_| BridgeError::InvalidUtf8)?;
                Ok(ScriptValue::str(s))
            }
            WireValue::Str(WireStr::Interned(index)) => {
                let table = table.ok_or(BridgeError::NoStringTable)?;
                let s = table.get(index).ok_or(BridgeError::InvalidStringIndex {
                    index,
                    len: table.len(),
                })?;
                Ok(ScriptValue::str(s))
            }
            WireValue::Ptr(Capsule(p)) => Ok(ScriptValue::Capsule(p)),
            WireValue::EmbeddedRef(h) => self.funcs.resolve(self.interp, RefKind::Embedded, h),
            WireValue::HostRef(h) => self.funcs.resolve(self.interp, RefKind::Host, h),
        }
    }
}
