//! Host-side test fixture: the three registry callables implemented over a
//! shared handle table, the way a real host embedding wires them up.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use trestle_bridge::{BridgeContext, HostCallback};
use trestle_script::{Interp, Module, ScriptError, ScriptObject, ScriptValue};

/// Attribute marking a host-owned stand-in object.
pub const HOST_HANDLE_ATTR: &str = "__host_handle";

/// Host-side proxy bookkeeping: handle table plus the pending-garbage queue.
pub struct HostRegistry {
    next: i64,
    by_handle: HashMap<i64, ScriptValue>,
    pending: VecDeque<i64>,
}

impl HostRegistry {
    fn new() -> Self {
        Self {
            next: 0,
            by_handle: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    fn register(&mut self, value: ScriptValue) -> i64 {
        self.next += 1;
        self.by_handle.insert(self.next, value);
        self.next
    }

    pub fn lookup(&self, handle: i64) -> Option<ScriptValue> {
        self.by_handle.get(&handle).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.by_handle.len()
    }

    /// Mark a handle as released by the host; it becomes drainable garbage.
    pub fn release(&mut self, handle: i64) {
        self.by_handle.remove(&handle);
        self.pending.push_back(handle);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Install the well-known `host` module backed by a fresh registry.
pub fn install_host_module(interp: &mut Interp) -> Rc<RefCell<HostRegistry>> {
    let registry = Rc::new(RefCell::new(HostRegistry::new()));
    let mut module = Module::new();

    let reg = registry.clone();
    module.define_fn("proxy", move |_, args| {
        let value = args
            .first()
            .cloned()
            .ok_or_else(|| ScriptError::new("proxy expects a value"))?;
        // Host stand-ins round-trip to their original host handle; anything
        // else gets a fresh embedded-side handle.
        if let ScriptValue::Object(obj) = &value {
            if let Some(id) = obj.get(HOST_HANDLE_ATTR).and_then(|v| v.as_int()) {
                return Ok(ScriptValue::tuple(vec![
                    ScriptValue::str("host"),
                    ScriptValue::Int(id),
                ]));
            }
        }
        let id = reg.borrow_mut().register(value);
        Ok(ScriptValue::tuple(vec![
            ScriptValue::str("embedded"),
            ScriptValue::Int(id),
        ]))
    });

    let reg = registry.clone();
    module.define_fn("resolve_as_object", move |_, args| {
        let kind = args
            .first()
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScriptError::new("resolve expects a kind tag"))?
            .to_string();
        let id = args
            .get(1)
            .and_then(|v| v.as_int())
            .ok_or_else(|| ScriptError::new("resolve expects a handle"))?;
        match kind.as_str() {
            "embedded" => reg
                .borrow()
                .lookup(id)
                .ok_or_else(|| ScriptError::new(format!("unknown embedded handle {}", id))),
            "host" => {
                let stand_in = ScriptObject::new();
                stand_in.set(HOST_HANDLE_ATTR, ScriptValue::Int(id));
                Ok(ScriptValue::Object(stand_in))
            }
            other => Err(ScriptError::new(format!("unknown kind \"{}\"", other))),
        }
    });

    let reg = registry.clone();
    module.define_fn("collect_garbage", move |_, _| {
        Ok(match reg.borrow_mut().pending.pop_front() {
            Some(id) => ScriptValue::Int(id),
            None => ScriptValue::None,
        })
    });

    interp.register_module("host", module);
    registry
}

/// A small embedded-side library the tests call into.
pub fn install_mathlib(interp: &mut Interp) {
    let mut module = Module::new();

    module.define_fn("add", |_, args| {
        let mut sum = 0;
        for v in args {
            sum += v
                .as_int()
                .ok_or_else(|| ScriptError::new("add expects integers"))?;
        }
        Ok(ScriptValue::Int(sum))
    });

    module.define_fn("swap", |_, args| {
        let (Some(a), Some(b)) = (args.first(), args.get(1)) else {
            return Err(ScriptError::new("swap expects two arguments"));
        };
        Ok(ScriptValue::tuple(vec![b.clone(), a.clone()]))
    });

    module.define_fn("greet", |_, args| {
        let name = args
            .first()
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScriptError::new("greet expects a name"))?;
        Ok(ScriptValue::str(format!("hello {}", name)))
    });

    module.define_fn("identity", |_, args| {
        args.first()
            .cloned()
            .ok_or_else(|| ScriptError::new("identity expects a value"))
    });

    module.define_fn("zero", |_, _| Ok(ScriptValue::Int(0)));

    module.define_fn("make_obj", |_, _| {
        let obj = ScriptObject::new();
        obj.set("fresh", ScriptValue::Bool(true));
        Ok(ScriptValue::Object(obj))
    });

    module.define_fn("has_host_handle", |_, args| {
        let id = args
            .get(1)
            .and_then(|v| v.as_int())
            .ok_or_else(|| ScriptError::new("has_host_handle expects (obj, id)"))?;
        match args.first() {
            Some(ScriptValue::Object(obj)) => Ok(ScriptValue::Bool(
                obj.get(HOST_HANDLE_ATTR).and_then(|v| v.as_int()) == Some(id),
            )),
            _ => Ok(ScriptValue::Bool(false)),
        }
    });

    module.define_fn("explode", |_, _| Err(ScriptError::new("division by zero")));

    module.define("answer", ScriptValue::Int(42));

    interp.register_module("mathlib", module);
}

/// Fully wired bridge over a fresh interpreter, mathlib included.
pub fn new_bridge(callback: Rc<HostCallback>) -> (BridgeContext, Rc<RefCell<HostRegistry>>) {
    let mut interp = Interp::new();
    let registry = install_host_module(&mut interp);
    install_mathlib(&mut interp);
    let ctx = BridgeContext::new(interp, callback).expect("bridge binding failed");
    (ctx, registry)
}

/// Callback that refuses every reverse call; for tests that never expect one.
pub fn no_callback() -> Rc<HostCallback> {
    Rc::new(|_, _| panic!("unexpected reverse call"))
}
