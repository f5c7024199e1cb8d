//! Dynamic values of the embedded script runtime.

use std::cell::RefCell;
use std::ffi::c_void;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::error::ScriptError;
use crate::interp::Interp;

/// Body of a script-visible callable. Receives the interpreter so the call
/// may re-enter the bridge in either direction.
pub type NativeFn = dyn Fn(&mut Interp, &[ScriptValue]) -> Result<ScriptValue, ScriptError>;

/// A callable value. Cheap to clone; the body is shared.
#[derive(Clone)]
pub struct ScriptFn {
    name: Rc<str>,
    body: Rc<NativeFn>,
}

impl ScriptFn {
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&mut Interp, &[ScriptValue]) -> Result<ScriptValue, ScriptError> + 'static,
    {
        Self {
            name: Rc::from(name),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(
        &self,
        interp: &mut Interp,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        (self.body)(interp, args)
    }
}

impl fmt::Debug for ScriptFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// An identity-bearing attribute record. Two clones refer to the same
/// underlying object; identity is the allocation address.
#[derive(Clone, Default)]
pub struct ScriptObject(Rc<RefCell<HashMap<Rc<str>, ScriptValue>>>);

impl ScriptObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ScriptValue> {
        self.0.borrow().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: ScriptValue) {
        self.0.borrow_mut().insert(Rc::from(key), value);
    }

    /// Stable identity for the lifetime of the object.
    pub fn ident(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<object {:#x}>", self.ident())
    }
}

/// One dynamically-typed script value.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Opaque host pointer, round-tripped by identity.
    Capsule(*mut c_void),
    /// Ordered fixed sequence; a call returning several values returns one.
    Tuple(Rc<[ScriptValue]>),
    Func(ScriptFn),
    Object(ScriptObject),
}

impl ScriptValue {
    pub fn str(s: impl AsRef<str>) -> Self {
        ScriptValue::Str(Rc::from(s.as_ref()))
    }

    pub fn tuple(items: Vec<ScriptValue>) -> Self {
        ScriptValue::Tuple(Rc::from(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::None => "none",
            ScriptValue::Bool(_) => "bool",
            ScriptValue::Int(_) => "int",
            ScriptValue::Float(_) => "float",
            ScriptValue::Str(_) => "str",
            ScriptValue::Capsule(_) => "capsule",
            ScriptValue::Tuple(_) => "tuple",
            ScriptValue::Func(_) => "function",
            ScriptValue::Object(_) => "object",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ScriptValue::Func(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScriptValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::Str(s) => Some(s),
            _ => None,
        }
    }
}
