//! Trestle bridge core.
//!
//! A bidirectional call-and-value bridge between a host runtime and an
//! embedded, dynamically-typed script runtime. Either side invokes functions
//! defined in the other; values cross the boundary as tagged
//! [`WireValue`]s, and foreign objects travel as opaque handles minted by a
//! host-side proxy registry.
//!
//! Direction host → embedded: resolve a function with
//! [`BridgeContext::get_function`], then invoke the returned handle with
//! [`BridgeContext::call_function`]. Direction embedded → host: script code
//! calls the `bridge.hostcall` entry point, which forwards the marshaled
//! arguments to the host callback bound at startup.
//!
//! Ownership at the boundary is strict: owned wire strings move with the
//! value and are released exactly once by the receiver; proxy handles stay
//! live until the host retires them through garbage draining.
//!
//! [`WireValue`]: trestle_wire::WireValue

pub mod capi;
pub mod codec;
pub mod context;
pub mod error;
pub mod marshal;
pub mod proxy;

pub use codec::Codec;
pub use context::{
    BridgeContext, HostCallback, ReplyBuf, BRIDGE_MODULE, ENTRY_HOSTCALL, ENTRY_WRITELOG,
    FN_GARBAGE, FN_PROXY, FN_RESOLVE, HOST_MODULE,
};
pub use error::{BridgeError, BridgeResult};
pub use proxy::BridgeFns;
