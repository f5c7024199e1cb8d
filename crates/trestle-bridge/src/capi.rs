//! C ABI for host runtimes driving the bridge through FFI.
//!
//! Error returns follow the owned-string contract: null on success,
//! otherwise a heap-allocated, null-terminated message the caller owns and
//! must release exactly once through [`trestle_string_free`]. Call frames
//! are opaque to C; the host builds them slot by slot and reads results back
//! through the accessor functions.

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::rc::Rc;

use trestle_script::Interp;
use trestle_wire::{Capsule, Handle, StringTable, WireStr, WireValue};

use crate::context::{BridgeContext, HostCallback};
use crate::error::BridgeError;

/// Wire tags as seen by C callers. Matches the order of
/// [`WireValue`] variants.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireTag {
    None = 0,
    Bool = 1,
    Int32 = 2,
    Int64 = 3,
    Real = 4,
    Str = 5,
    Ptr = 6,
    EmbeddedRef = 7,
    HostRef = 8,
}

/// Opaque call frame exchanged across the C boundary.
pub struct CallFrame {
    values: Vec<WireValue>,
}

/// Construct a bridge and hand ownership to a C caller. Release with
/// [`trestle_bridge_free`].
pub fn bridge_into_raw(interp: Interp, callback: Rc<HostCallback>) -> Result<*mut BridgeContext, BridgeError> {
    let ctx = BridgeContext::new(interp, callback)?;
    Ok(Box::into_raw(Box::new(ctx)))
}

fn error_string(e: BridgeError) -> *mut c_char {
    let msg = e.to_string().replace('\0', " ");
    match CString::new(msg) {
        Ok(s) => s.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn tag_of(v: &WireValue) -> WireTag {
    match v {
        WireValue::None => WireTag::None,
        WireValue::Bool(_) => WireTag::Bool,
        WireValue::Int32(_) => WireTag::Int32,
        WireValue::Int64(_) => WireTag::Int64,
        WireValue::Real(_) => WireTag::Real,
        WireValue::Str(_) => WireTag::Str,
        WireValue::Ptr(_) => WireTag::Ptr,
        WireValue::EmbeddedRef(_) => WireTag::EmbeddedRef,
        WireValue::HostRef(_) => WireTag::HostRef,
    }
}

/// Release a string previously returned by this ABI (error messages and
/// string accessors alike). Null is accepted and ignored.
#[no_mangle]
pub unsafe extern "C" fn trestle_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_bridge_free(ctx: *mut BridgeContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}

// ---- call frames -----------------------------------------------------------

#[no_mangle]
pub extern "C" fn trestle_frame_new() -> *mut CallFrame {
    Box::into_raw(Box::new(CallFrame { values: Vec::new() }))
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_free(frame: *mut CallFrame) {
    if !frame.is_null() {
        drop(Box::from_raw(frame));
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_len(frame: *const CallFrame) -> usize {
    match frame.as_ref() {
        Some(f) => f.values.len(),
        None => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_clear(frame: *mut CallFrame) {
    if let Some(f) = frame.as_mut() {
        f.values.clear();
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_none(frame: *mut CallFrame) {
    if let Some(f) = frame.as_mut() {
        f.values.push(WireValue::None);
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_bool(frame: *mut CallFrame, v: bool) {
    if let Some(f) = frame.as_mut() {
        f.values.push(WireValue::Bool(v));
    }
}

/// Push an integer; values outside the signed 32-bit range are carried as
/// int64, never truncated.
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_int(frame: *mut CallFrame, v: i64) {
    if let Some(f) = frame.as_mut() {
        f.values.push(WireValue::from_int(v));
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_real(frame: *mut CallFrame, v: f64) {
    if let Some(f) = frame.as_mut() {
        f.values.push(WireValue::Real(v));
    }
}

/// Push a copy of a null-terminated string as an owned wire buffer. Returns
/// false when the frame or string pointer is null.
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_str(frame: *mut CallFrame, s: *const c_char) -> bool {
    let (Some(f), false) = (frame.as_mut(), s.is_null()) else {
        return false;
    };
    let owned = CStr::from_ptr(s).to_owned();
    f.values.push(WireValue::Str(WireStr::Owned(owned)));
    true
}

/// Push a string by index into the caller-owned table supplied at call time.
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_str_index(frame: *mut CallFrame, index: u32) {
    if let Some(f) = frame.as_mut() {
        f.values.push(WireValue::Str(WireStr::Interned(index)));
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_ptr(frame: *mut CallFrame, p: *mut c_void) {
    if let Some(f) = frame.as_mut() {
        f.values.push(WireValue::Ptr(Capsule(p)));
    }
}

/// Push a reference handle. `host_owned` selects the owner side.
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_push_ref(
    frame: *mut CallFrame,
    handle: i64,
    host_owned: bool,
) {
    if let Some(f) = frame.as_mut() {
        let h = Handle::new(handle);
        f.values.push(if host_owned {
            WireValue::HostRef(h)
        } else {
            WireValue::EmbeddedRef(h)
        });
    }
}

/// Tag of slot `index`, or -1 when out of range.
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_tag(frame: *const CallFrame, index: usize) -> i32 {
    match frame.as_ref().and_then(|f| f.values.get(index)) {
        Some(v) => tag_of(v) as i32,
        None => -1,
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_get_bool(
    frame: *const CallFrame,
    index: usize,
    out: *mut bool,
) -> bool {
    match frame.as_ref().and_then(|f| f.values.get(index)) {
        Some(WireValue::Bool(b)) if !out.is_null() => {
            *out = *b;
            true
        }
        _ => false,
    }
}

/// Read an integer slot (int32 or int64).
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_get_int(
    frame: *const CallFrame,
    index: usize,
    out: *mut i64,
) -> bool {
    if out.is_null() {
        return false;
    }
    match frame.as_ref().and_then(|f| f.values.get(index)) {
        Some(WireValue::Int32(n)) => {
            *out = *n as i64;
            true
        }
        Some(WireValue::Int64(n)) => {
            *out = *n;
            true
        }
        _ => false,
    }
}

#[no_mangle]
pub unsafe extern "C" fn trestle_frame_get_real(
    frame: *const CallFrame,
    index: usize,
    out: *mut f64,
) -> bool {
    match frame.as_ref().and_then(|f| f.values.get(index)) {
        Some(WireValue::Real(x)) if !out.is_null() => {
            *out = *x;
            true
        }
        _ => false,
    }
}

/// Copy an owned string slot out. The returned buffer belongs to the caller
/// (release with [`trestle_string_free`]); null when the slot is not an
/// owned string.
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_get_str(
    frame: *const CallFrame,
    index: usize,
) -> *mut c_char {
    match frame.as_ref().and_then(|f| f.values.get(index)) {
        Some(WireValue::Str(WireStr::Owned(s))) => s.clone().into_raw(),
        _ => ptr::null_mut(),
    }
}

/// Read a reference slot. `out_host_owned` reports the owner side.
#[no_mangle]
pub unsafe extern "C" fn trestle_frame_get_ref(
    frame: *const CallFrame,
    index: usize,
    out_handle: *mut i64,
    out_host_owned: *mut bool,
) -> bool {
    if out_handle.is_null() || out_host_owned.is_null() {
        return false;
    }
    match frame.as_ref().and_then(|f| f.values.get(index)) {
        Some(WireValue::EmbeddedRef(h)) => {
            *out_handle = h.raw();
            *out_host_owned = false;
            true
        }
        Some(WireValue::HostRef(h)) => {
            *out_handle = h.raw();
            *out_host_owned = true;
            true
        }
        _ => false,
    }
}

// ---- bridge operations -----------------------------------------------------

/// Resolve and proxy an embedded function. On failure the out handle is
/// zero and the returned message names the failing step.
#[no_mangle]
pub unsafe extern "C" fn trestle_get_function(
    ctx: *mut BridgeContext,
    module: *const c_char,
    name: *const c_char,
    out_handle: *mut i64,
) -> *mut c_char {
    if out_handle.is_null() {
        return error_string(BridgeError::Protocol("null out_handle".into()));
    }
    *out_handle = Handle::NULL.raw();
    let Some(ctx) = ctx.as_mut() else {
        return error_string(BridgeError::Protocol("null bridge context".into()));
    };
    if module.is_null() || name.is_null() {
        return error_string(BridgeError::Protocol("null module or function name".into()));
    }
    let (Ok(module), Ok(name)) = (
        CStr::from_ptr(module).to_str(),
        CStr::from_ptr(name).to_str(),
    ) else {
        return error_string(BridgeError::InvalidUtf8);
    };
    match ctx.get_function(module, name) {
        Ok(handle) => {
            *out_handle = handle.raw();
            ptr::null_mut()
        }
        Err(e) => error_string(e),
    }
}

/// Invoke the embedded callable in `frame[0]`. `strs`/`strc` is the optional
/// caller-owned string table for interned string slots. Results overwrite
/// the frame; `out_count` receives the result count.
#[no_mangle]
pub unsafe extern "C" fn trestle_call_function(
    ctx: *mut BridgeContext,
    frame: *mut CallFrame,
    strs: *const *const c_char,
    strc: usize,
    out_count: *mut usize,
) -> *mut c_char {
    if !out_count.is_null() {
        *out_count = 0;
    }
    let (Some(ctx), Some(frame)) = (ctx.as_mut(), frame.as_mut()) else {
        return error_string(BridgeError::Protocol("null bridge context or frame".into()));
    };

    let mut entries: Vec<&str> = Vec::with_capacity(strc);
    if !strs.is_null() {
        for i in 0..strc {
            let p = *strs.add(i);
            if p.is_null() {
                return error_string(BridgeError::Protocol("null string table entry".into()));
            }
            match CStr::from_ptr(p).to_str() {
                Ok(s) => entries.push(s),
                Err(_) => return error_string(BridgeError::InvalidUtf8),
            }
        }
    }
    let table = (!strs.is_null()).then(|| StringTable::new(&entries));

    match ctx.call_function(&mut frame.values, table.as_ref()) {
        Ok(count) => {
            if !out_count.is_null() {
                *out_count = count;
            }
            ptr::null_mut()
        }
        Err(e) => error_string(e),
    }
}

/// Drain at most `max` retired proxy handles into `out`. Mirrors the
/// original int-array signature: the return value is the number written;
/// errors end the drain with zero results.
#[no_mangle]
pub unsafe extern "C" fn trestle_collect_garbage(
    ctx: *mut BridgeContext,
    out: *mut i64,
    max: usize,
) -> usize {
    let (Some(ctx), false) = (ctx.as_mut(), out.is_null()) else {
        return 0;
    };
    match ctx.collect_garbage(max) {
        Ok(retired) => {
            for (i, h) in retired.iter().enumerate() {
                *out.add(i) = h.raw();
            }
            retired.len()
        }
        Err(_) => 0,
    }
}
