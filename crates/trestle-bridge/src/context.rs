//! Bridge context: startup binding, call routing, and the embedded-visible
//! entry points.
//!
//! One [`BridgeContext`] is constructed per bridge instance and owns all the
//! wiring; there is no process-wide state, so independent bridges coexist
//! and tear down deterministically when dropped. The model is
//! single-threaded and re-entrant: a host→embedded call may synchronously
//! re-enter the bridge in the opposite direction, each layer building its
//! own per-call codec over the shared interpreter.

use std::rc::Rc;

use tracing::{debug, error, info, trace, warn};
use trestle_script::{Interp, Module, ScriptError, ScriptFn, ScriptValue};
use trestle_wire::{Handle, RefKind, StringTable, WireValue, MAX_CALL_VALUES};

use crate::codec::Codec;
use crate::error::{BridgeError, BridgeResult};
use crate::marshal;
use crate::proxy::BridgeFns;

/// Well-known embedded-side module holding the three registry callables.
pub const HOST_MODULE: &str = "host";
pub const FN_PROXY: &str = "proxy";
pub const FN_RESOLVE: &str = "resolve_as_object";
pub const FN_GARBAGE: &str = "collect_garbage";

/// Embedded-visible module the bridge registers at startup.
pub const BRIDGE_MODULE: &str = "bridge";
pub const ENTRY_HOSTCALL: &str = "hostcall";
pub const ENTRY_WRITELOG: &str = "writelog";

/// Output buffer the host callback writes an optional string reply into.
#[derive(Default)]
pub struct ReplyBuf {
    text: Option<String>,
}

impl ReplyBuf {
    /// Append reply text, starting the buffer on first use.
    pub fn push(&mut self, s: &str) {
        self.text.get_or_insert_with(String::new).push_str(s);
    }

    /// Take the reply, leaving the buffer empty. `None` means the callback
    /// never pushed anything.
    pub fn take(&mut self) -> Option<String> {
        self.text.take()
    }
}

/// Host-side callback receiving reverse calls: the marshaled argument array
/// and a reply buffer. Returns a status code; zero is success.
pub type HostCallback = dyn Fn(&[WireValue], &mut ReplyBuf) -> i32;

/// A live bridge between one host embedding and one embedded interpreter.
#[derive(Debug)]
pub struct BridgeContext {
    interp: Interp,
    funcs: BridgeFns,
}

impl BridgeContext {
    /// Bind the bridge.
    ///
    /// Resolves the three registry callables inside the well-known
    /// [`HOST_MODULE`] and registers the embedded-visible entry points. A
    /// missing module fails immediately; missing or non-callable registry
    /// methods are each reported before the constructor gives up.
    pub fn new(mut interp: Interp, callback: Rc<HostCallback>) -> BridgeResult<Self> {
        let funcs = {
            let Some(module) = interp.module(HOST_MODULE) else {
                error!(module = HOST_MODULE, "failed to load bridge module");
                return Err(BridgeError::ModuleNotFound(HOST_MODULE.to_string()));
            };

            let mut missing = Vec::new();
            let proxy = bind_method(module, FN_PROXY, &mut missing);
            let resolve = bind_method(module, FN_RESOLVE, &mut missing);
            let garbage = bind_method(module, FN_GARBAGE, &mut missing);
            match (proxy, resolve, garbage) {
                (Some(proxy), Some(resolve), Some(garbage)) => {
                    BridgeFns::new(proxy, resolve, garbage)
                }
                _ => return Err(BridgeError::MissingBridgeFns(missing)),
            }
        };

        let mut bridge = Module::new();
        bridge.define(ENTRY_HOSTCALL, hostcall_fn(funcs.clone(), callback));
        bridge.define(ENTRY_WRITELOG, writelog_fn());
        interp.register_module(BRIDGE_MODULE, bridge);

        info!("bridge bound");
        Ok(Self { interp, funcs })
    }

    /// Resolve `module.name` in the embedded runtime and proxy-wrap it so
    /// the host holds an opaque handle, not the callable itself.
    pub fn get_function(&mut self, module: &str, name: &str) -> BridgeResult<Handle> {
        let func = self.lookup_callable(module, name)?;
        let (kind, handle) = self.funcs.proxy(&mut self.interp, func)?;
        // A function resolved in the embedded runtime must come back
        // embedded-owned; anything else breaks the registry contract.
        if kind != RefKind::Embedded {
            return Err(BridgeError::Protocol(format!(
                "proxied function [{}.{}] reported owner \"{}\"",
                module,
                name,
                kind.tag()
            )));
        }
        debug!(module, name, handle = handle.raw(), "resolved embedded function");
        Ok(handle)
    }

    fn lookup_callable(&self, module: &str, name: &str) -> BridgeResult<ScriptValue> {
        let m = self
            .interp
            .module(module)
            .ok_or_else(|| BridgeError::ModuleNotFound(module.to_string()))?;
        let v = m.attr(name).ok_or_else(|| BridgeError::FunctionNotFound {
            module: module.to_string(),
            name: name.to_string(),
        })?;
        if !v.is_callable() {
            return Err(BridgeError::NotCallable {
                module: module.to_string(),
                name: name.to_string(),
                type_name: v.type_name(),
            });
        }
        Ok(v.clone())
    }

    /// Invoke the embedded callable named by `frame[0]`, with the remaining
    /// slots as positional arguments (a frame of length one is a
    /// zero-argument call). The arguments are consumed by the call; the
    /// result values replace them in the frame. Returns the result count.
    pub fn call_function(
        &mut self,
        frame: &mut Vec<WireValue>,
        table: Option<&StringTable<'_>>,
    ) -> BridgeResult<usize> {
        if frame.len() > MAX_CALL_VALUES {
            return Err(BridgeError::Capacity {
                count: frame.len(),
                max: MAX_CALL_VALUES,
            });
        }
        if !matches!(frame.first(), Some(WireValue::EmbeddedRef(_))) {
            return Err(BridgeError::NeedFunction);
        }

        let incoming = std::mem::take(frame);
        let native = {
            let mut codec = Codec::new(&mut self.interp, &self.funcs);
            marshal::unmarshal_args(&mut codec, incoming, table)?
        };
        let Some((func, args)) = native.split_first() else {
            return Err(BridgeError::EmptyArgs);
        };

        trace!(argc = args.len(), "invoking embedded function");
        let ret = self
            .interp
            .call(func, args)
            .map_err(|e| BridgeError::ScriptFault(e.to_string()))?;

        let results = {
            let mut codec = Codec::new(&mut self.interp, &self.funcs);
            marshal::marshal_result(&mut codec, &ret)?
        };
        let count = results.len();
        *frame = results;
        Ok(count)
    }

    /// Drain at most `max` pending, host-released proxy handles.
    pub fn collect_garbage(&mut self, max: usize) -> BridgeResult<Vec<Handle>> {
        let retired = self.funcs.drain_garbage(&mut self.interp, max)?;
        debug!(count = retired.len(), "drained retired proxies");
        Ok(retired)
    }

    pub fn interp(&self) -> &Interp {
        &self.interp
    }

    pub fn interp_mut(&mut self) -> &mut Interp {
        &mut self.interp
    }
}

/// Resolve one registry callable, recording it as missing when absent or
/// not callable. Every entry is reported before binding fails.
fn bind_method(
    module: &Module,
    name: &str,
    missing: &mut Vec<String>,
) -> Option<ScriptValue> {
    match module.attr(name) {
        Some(v) if v.is_callable() => Some(v.clone()),
        _ => {
            error!(method = name, "cannot find bridge method");
            missing.push(name.to_string());
            None
        }
    }
}

/// Entry point script code calls to invoke the host.
///
/// Incoming arguments are marshaled (foreign values proxied) and forwarded
/// to the host callback with a reply buffer. The callback status is
/// propagated: nonzero raises a script-side fault, otherwise the reply
/// string (or none) becomes the script-visible return value.
fn hostcall_fn(funcs: BridgeFns, callback: Rc<HostCallback>) -> ScriptValue {
    ScriptValue::Func(ScriptFn::new(ENTRY_HOSTCALL, move |interp, args| {
        let wire = {
            let mut codec = Codec::new(interp, &funcs);
            marshal::marshal_args(&mut codec, args).map_err(|e| ScriptError::new(e.to_string()))?
        };
        trace!(argc = wire.len(), "reverse call into host");

        let mut reply = ReplyBuf::default();
        let status = callback(&wire, &mut reply);
        if status != 0 {
            return Err(ScriptError::new(format!(
                "host callback failed (status {})",
                status
            )));
        }
        Ok(match reply.take() {
            Some(text) => ScriptValue::str(text),
            None => ScriptValue::None,
        })
    }))
}

/// Logging pass-through: `(level, message)` forwarded to the host log sink
/// at the mapped severity.
fn writelog_fn() -> ScriptValue {
    ScriptValue::Func(ScriptFn::new(ENTRY_WRITELOG, |_, args| {
        let level = args.first().and_then(|v| v.as_int());
        let msg = args.get(1).and_then(|v| v.as_str());
        let (Some(level), Some(msg)) = (level, msg) else {
            return Err(ScriptError::new("writelog expects (level, message)"));
        };
        match level {
            0 => trace!(target: "trestle::script", "{}", msg),
            1 => debug!(target: "trestle::script", "{}", msg),
            2 => info!(target: "trestle::script", "{}", msg),
            3 => warn!(target: "trestle::script", "{}", msg),
            _ => error!(target: "trestle::script", "{}", msg),
        }
        Ok(ScriptValue::None)
    }))
}
