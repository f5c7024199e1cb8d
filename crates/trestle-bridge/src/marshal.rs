//! Element-wise conversion of whole argument and result sequences.
//!
//! All three entry points share the same rules: an empty sequence is an
//! error in every call direction, the first failing element aborts the whole
//! conversion with no partial result, and the per-call value bound is
//! enforced before any element is touched.

use trestle_script::ScriptValue;
use trestle_wire::{StringTable, WireValue, MAX_CALL_VALUES};

use crate::codec::Codec;
use crate::error::{BridgeError, BridgeResult};

/// Marshal an ordered argument sequence into wire values.
pub fn marshal_args(
    codec: &mut Codec<'_>,
    values: &[ScriptValue],
) -> BridgeResult<Vec<WireValue>> {
    if values.is_empty() {
        return Err(BridgeError::EmptyArgs);
    }
    check_capacity(values.len())?;
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        out.push(codec.to_wire(v)?);
    }
    Ok(out)
}

/// Marshal a call result. A tuple spreads element-wise; any other value is a
/// result list of length one.
pub fn marshal_result(codec: &mut Codec<'_>, value: &ScriptValue) -> BridgeResult<Vec<WireValue>> {
    match value {
        ScriptValue::Tuple(items) => marshal_args(codec, items),
        single => Ok(vec![codec.to_wire(single)?]),
    }
}

/// Unmarshal wire values into script values, consuming the input.
pub fn unmarshal_args(
    codec: &mut Codec<'_>,
    values: Vec<WireValue>,
    table: Option<&StringTable<'_>>,
) -> BridgeResult<Vec<ScriptValue>> {
    if values.is_empty() {
        return Err(BridgeError::EmptyArgs);
    }
    check_capacity(values.len())?;
    values
        .into_iter()
        .map(|v| codec.from_wire(v, table))
        .collect()
}

fn check_capacity(count: usize) -> BridgeResult<()> {
    if count > MAX_CALL_VALUES {
        return Err(BridgeError::Capacity {
            count,
            max: MAX_CALL_VALUES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trestle_script::{Interp, ScriptError, ScriptFn};
    use crate::proxy::BridgeFns;

    fn unreachable_fns() -> BridgeFns {
        let dead = |name: &'static str| {
            ScriptValue::Func(ScriptFn::new(name, move |_, _| {
                Err(ScriptError::new(format!("{} must not be called", name)))
            }))
        };
        BridgeFns::new(dead("proxy"), dead("resolve"), dead("collect_garbage"))
    }

    #[test]
    fn empty_sequence_message_is_stable() {
        let mut interp = Interp::new();
        let fns = unreachable_fns();
        let mut codec = Codec::new(&mut interp, &fns);

        let err = marshal_args(&mut codec, &[]).unwrap_err();
        assert_eq!(err.to_string(), "must supply at least one argument");

        let err = unmarshal_args(&mut codec, Vec::new(), None).unwrap_err();
        assert_eq!(err.to_string(), "must supply at least one argument");

        // Result marshaling follows the same rule for an empty tuple.
        let err = marshal_result(&mut codec, &ScriptValue::tuple(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "must supply at least one argument");
    }

    #[test]
    fn single_result_is_length_one() {
        let mut interp = Interp::new();
        let fns = unreachable_fns();
        let mut codec = Codec::new(&mut interp, &fns);

        let out = marshal_result(&mut codec, &ScriptValue::Int(9)).unwrap();
        assert_eq!(out, vec![WireValue::Int32(9)]);
    }

    #[test]
    fn tuple_result_spreads() {
        let mut interp = Interp::new();
        let fns = unreachable_fns();
        let mut codec = Codec::new(&mut interp, &fns);

        let out = marshal_result(
            &mut codec,
            &ScriptValue::tuple(vec![ScriptValue::Int(1), ScriptValue::Bool(false)]),
        )
        .unwrap();
        assert_eq!(out, vec![WireValue::Int32(1), WireValue::Bool(false)]);
    }

    #[test]
    fn first_error_aborts() {
        let mut interp = Interp::new();
        let fns = unreachable_fns();
        let mut codec = Codec::new(&mut interp, &fns);

        // Second element faults (proxy callable refuses); nothing is
        // returned for the first.
        let args = [
            ScriptValue::Int(1),
            ScriptValue::tuple(vec![ScriptValue::Int(2)]),
            ScriptValue::Int(3),
        ];
        let err = marshal_args(&mut codec, &args).unwrap_err();
        assert!(matches!(err, BridgeError::Protocol(_)));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut interp = Interp::new();
        let fns = unreachable_fns();
        let mut codec = Codec::new(&mut interp, &fns);

        let args = vec![ScriptValue::Int(0); MAX_CALL_VALUES + 1];
        let err = marshal_args(&mut codec, &args).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Capacity { count, max }
                if count == MAX_CALL_VALUES + 1 && max == MAX_CALL_VALUES
        ));

        let ok = vec![ScriptValue::Int(0); MAX_CALL_VALUES];
        assert_eq!(
            marshal_args(&mut codec, &ok).unwrap().len(),
            MAX_CALL_VALUES
        );
    }
}
