//! Thin adapter over the three host-supplied registry callables.
//!
//! The registry itself (handle bookkeeping, identity maps, the pending
//! garbage queue) lives on the host side; this module only invokes the three
//! callables and decodes their results. Handles are opaque: nothing here
//! assumes they are stable or dense.

use trestle_script::{Interp, ScriptValue};
use trestle_wire::{Handle, RefKind};

use crate::error::{BridgeError, BridgeResult};

/// The three bridge callables resolved once at startup: wrap a foreign value
/// behind a handle, resolve a handle back to a live value, and drain retired
/// handles.
#[derive(Debug, Clone)]
pub struct BridgeFns {
    pub(crate) proxy: ScriptValue,
    pub(crate) resolve: ScriptValue,
    pub(crate) garbage: ScriptValue,
}

impl BridgeFns {
    pub fn new(proxy: ScriptValue, resolve: ScriptValue, garbage: ScriptValue) -> Self {
        Self {
            proxy,
            resolve,
            garbage,
        }
    }

    /// Wrap a foreign value behind an integer handle. The registry answers
    /// with a `(kind, handle)` pair naming the owning side.
    pub fn proxy(
        &self,
        interp: &mut Interp,
        value: ScriptValue,
    ) -> BridgeResult<(RefKind, Handle)> {
        let ret = interp
            .call(&self.proxy, &[value])
            .map_err(|e| BridgeError::Protocol(format!("proxy call failed: {}", e)))?;
        decode_proxy_pair(&ret)
    }

    /// Resolve a handle into a live script-runtime value standing in for the
    /// foreign object.
    pub fn resolve(
        &self,
        interp: &mut Interp,
        kind: RefKind,
        handle: Handle,
    ) -> BridgeResult<ScriptValue> {
        interp
            .call(
                &self.resolve,
                &[ScriptValue::str(kind.tag()), ScriptValue::Int(handle.raw())],
            )
            .map_err(|e| BridgeError::Protocol(format!("resolve call failed: {}", e)))
    }

    /// Drain up to `max` handles whose host-side counterpart was destroyed.
    ///
    /// A `none` result is the registry's no-more-pending sentinel and stops
    /// the loop early; a faulting collector call likewise ends the drain
    /// with whatever was gathered so far.
    pub fn drain_garbage(&self, interp: &mut Interp, max: usize) -> BridgeResult<Vec<Handle>> {
        let mut retired = Vec::new();
        for _ in 0..max {
            let ret = match interp.call(&self.garbage, &[]) {
                Ok(v) => v,
                Err(_) => break,
            };
            match ret {
                ScriptValue::None => break,
                ScriptValue::Int(id) => retired.push(Handle::new(id)),
                other => {
                    return Err(BridgeError::Protocol(format!(
                        "collector returned {}, expected an integer handle",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(retired)
    }
}

/// Decode the `(kind, handle)` pair every successful proxy call returns.
fn decode_proxy_pair(ret: &ScriptValue) -> BridgeResult<(RefKind, Handle)> {
    let items = match ret {
        ScriptValue::Tuple(items) if items.len() == 2 => items,
        other => {
            return Err(BridgeError::Protocol(format!(
                "proxy returned {}, expected a (kind, handle) pair",
                other.type_name()
            )))
        }
    };
    let kind = items[0]
        .as_str()
        .and_then(RefKind::from_tag)
        .ok_or_else(|| BridgeError::Protocol("proxy returned an unknown owner tag".into()))?;
    let handle = items[1]
        .as_int()
        .ok_or_else(|| BridgeError::Protocol("proxy returned a non-integer handle".into()))?;
    Ok((kind, Handle::new(handle)))
}
