//! Bridge errors.

use std::fmt;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug)]
pub enum BridgeError {
    /// Embedded module not found. Fatal when raised during startup binding.
    ModuleNotFound(String),
    /// Module exists but has no such attribute.
    FunctionNotFound { module: String, name: String },
    /// Attribute exists but is not callable.
    NotCallable {
        module: String,
        name: String,
        type_name: &'static str,
    },
    /// One or more of the three registry callables is missing or not
    /// callable; every missing name is listed.
    MissingBridgeFns(Vec<String>),
    /// A registry callable returned an undecodable shape or unknown tag.
    Protocol(String),
    /// Empty argument or result sequence.
    EmptyArgs,
    /// Call frame slot 0 is not an embedded callable reference.
    NeedFunction,
    /// Interned string index outside the supplied table.
    InvalidStringIndex { index: u32, len: usize },
    /// Interned string used in a call that supplied no string table.
    NoStringTable,
    /// String cannot cross the boundary as a null-terminated buffer.
    NulInString,
    /// Owned string buffer is not valid UTF-8.
    InvalidUtf8,
    /// Call carries more values than the documented bound.
    Capacity { count: usize, max: usize },
    /// The target call raised in its own runtime; its diagnostic is wrapped.
    ScriptFault(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::ModuleNotFound(module) => {
                write!(f, "failed to load module \"{}\"", module)
            }
            BridgeError::FunctionNotFound { module, name } => {
                write!(f, "cannot find function \"{}\" in module \"{}\"", name, module)
            }
            BridgeError::NotCallable {
                module,
                name,
                type_name,
            } => write!(f, "invalid type {} for [{}.{}]", type_name, module, name),
            BridgeError::MissingBridgeFns(names) => {
                write!(f, "missing bridge methods: {}", names.join(", "))
            }
            BridgeError::Protocol(msg) => write!(f, "bridge protocol violation: {}", msg),
            BridgeError::EmptyArgs => write!(f, "must supply at least one argument"),
            BridgeError::NeedFunction => write!(f, "need function"),
            BridgeError::InvalidStringIndex { index, len } => {
                write!(f, "invalid string id {} (table holds {})", index, len)
            }
            BridgeError::NoStringTable => {
                write!(f, "interned string without a string table")
            }
            BridgeError::NulInString => {
                write!(f, "string contains an interior NUL byte")
            }
            BridgeError::InvalidUtf8 => write!(f, "string buffer is not valid UTF-8"),
            BridgeError::Capacity { count, max } => {
                write!(f, "call carries {} values, limit is {}", count, max)
            }
            BridgeError::ScriptFault(msg) => {
                write!(f, "call to script function failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for BridgeError {}
