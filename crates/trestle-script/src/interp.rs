//! Module registry and call entry of the embedded interpreter.

use hashbrown::HashMap;

use crate::error::ScriptError;
use crate::value::{ScriptFn, ScriptValue};

/// A named attribute namespace inside the interpreter.
#[derive(Debug, Default)]
pub struct Module {
    attrs: HashMap<String, ScriptValue>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, value: ScriptValue) {
        self.attrs.insert(name.to_string(), value);
    }

    /// Define a native function attribute.
    pub fn define_fn<F>(&mut self, name: &str, body: F)
    where
        F: Fn(&mut Interp, &[ScriptValue]) -> Result<ScriptValue, ScriptError> + 'static,
    {
        self.define(name, ScriptValue::Func(ScriptFn::new(name, body)));
    }

    pub fn attr(&self, name: &str) -> Option<&ScriptValue> {
        self.attrs.get(name)
    }
}

/// The embedded interpreter as the bridge sees it: a module table and a
/// synchronous call entry.
///
/// Single-threaded and re-entrant: a callable receives `&mut Interp` and may
/// invoke further script or bridge functions before returning. No call
/// suspends; every invocation blocks until the callee returns.
#[derive(Debug, Default)]
pub struct Interp {
    modules: HashMap<String, Module>,
}

impl Interp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module(&mut self, name: &str, module: Module) {
        self.modules.insert(name.to_string(), module);
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Cloned attribute lookup, `module.name`.
    pub fn attr(&self, module: &str, name: &str) -> Option<ScriptValue> {
        self.modules.get(module)?.attr(name).cloned()
    }

    /// Invoke a callable value. Non-callables fault with the same shape of
    /// diagnostic the interpreter itself would raise.
    pub fn call(
        &mut self,
        func: &ScriptValue,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        match func {
            ScriptValue::Func(f) => {
                let f = f.clone();
                f.invoke(self, args)
            }
            other => Err(ScriptError::new(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn math_interp() -> Interp {
        let mut interp = Interp::new();
        let mut m = Module::new();
        m.define_fn("double", |_, args| {
            let n = args
                .first()
                .and_then(|v| v.as_int())
                .ok_or_else(|| ScriptError::new("double expects an int"))?;
            Ok(ScriptValue::Int(n * 2))
        });
        m.define("pi", ScriptValue::Float(3.14));
        interp.register_module("math", m);
        interp
    }

    #[test]
    fn call_registered_function() {
        let mut interp = math_interp();
        let f = interp.attr("math", "double").unwrap();
        let ret = interp.call(&f, &[ScriptValue::Int(21)]).unwrap();
        assert_eq!(ret.as_int(), Some(42));
    }

    #[test]
    fn call_non_callable_faults() {
        let mut interp = math_interp();
        let pi = interp.attr("math", "pi").unwrap();
        let err = interp.call(&pi, &[]).unwrap_err();
        assert_eq!(err.to_string(), "'float' object is not callable");
    }

    #[test]
    fn missing_lookups() {
        let interp = math_interp();
        assert!(interp.module("nomodule").is_none());
        assert!(interp.attr("math", "nofunc").is_none());
    }

    #[test]
    fn reentrant_call() {
        let mut interp = math_interp();
        let mut m = Module::new();
        // Calls math.double from inside another script function.
        m.define_fn("quadruple", |interp, args| {
            let double = interp
                .attr("math", "double")
                .ok_or_else(|| ScriptError::new("math.double missing"))?;
            let once = interp.call(&double, args)?;
            interp.call(&double, &[once])
        });
        interp.register_module("more", m);

        let f = interp.attr("more", "quadruple").unwrap();
        let ret = interp.call(&f, &[ScriptValue::Int(3)]).unwrap();
        assert_eq!(ret.as_int(), Some(12));
    }

    #[test]
    fn fault_diagnostic_passes_through() {
        let mut interp = Interp::new();
        let mut m = Module::new();
        m.define_fn("explode", |_, _| Err(ScriptError::new("boom")));
        interp.register_module("bad", m);

        let f = interp.attr("bad", "explode").unwrap();
        let err = interp.call(&f, &[]).unwrap_err();
        assert_eq!(err.message(), "boom");
    }
}
