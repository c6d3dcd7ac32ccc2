use std::collections::BTreeMap;

use rhai::{Array, Dynamic, ImmutableString, Map, Position, FLOAT, INT};
use sb_core::{BackendFailure, SbValue, StackFrame};

pub(crate) fn value_to_dynamic(value: &SbValue) -> Dynamic {
    match value {
        SbValue::Unit => Dynamic::UNIT,
        SbValue::Bool(value) => Dynamic::from_bool(*value),
        SbValue::Int(value) => Dynamic::from_int(*value as INT),
        SbValue::Float(value) => Dynamic::from_float(*value as FLOAT),
        SbValue::String(value) => Dynamic::from(value.clone()),
        SbValue::Array(values) => {
            let array = values.iter().map(value_to_dynamic).collect::<Array>();
            Dynamic::from_array(array)
        }
        SbValue::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.as_str().into(), value_to_dynamic(value));
            }
            Dynamic::from_map(map)
        }
    }
}

pub(crate) fn dynamic_to_value(value: Dynamic) -> Result<SbValue, BackendFailure> {
    if value.is_unit() {
        return Ok(SbValue::Unit);
    }
    if value.is::<bool>() {
        return Ok(SbValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(SbValue::Int(value.cast::<INT>() as i64));
    }
    if value.is::<FLOAT>() {
        return Ok(SbValue::Float(value.cast::<FLOAT>() as f64));
    }
    if value.is::<ImmutableString>() {
        return Ok(SbValue::String(value.cast::<ImmutableString>().to_string()));
    }
    if value.is::<char>() {
        return Ok(SbValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_value(item)?);
        }
        return Ok(SbValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_value(value)?);
        }
        return Ok(SbValue::Map(out));
    }

    Err(BackendFailure::raised(format!(
        "Unsupported script value type \"{}\".",
        value.type_name()
    )))
}

/// Text of a thrown value: strings as-is, anything else through `Display`.
pub(crate) fn dynamic_message(value: &Dynamic) -> String {
    if value.is::<ImmutableString>() {
        return value.clone().cast::<ImmutableString>().to_string();
    }
    value.to_string()
}

pub(crate) fn position_frame(source: &str, position: Position) -> StackFrame {
    StackFrame::new(source).at(position.line(), position.position())
}

#[cfg(test)]
mod rhai_bridge_tests {
    use super::*;

    #[test]
    fn scalar_values_keep_their_kind() {
        for value in [
            SbValue::Unit,
            SbValue::Bool(true),
            SbValue::Int(-7),
            SbValue::Float(2.5),
            SbValue::String("héllo".to_string()),
        ] {
            let back = dynamic_to_value(value_to_dynamic(&value)).expect("convert back");
            assert_eq!(back, value);
        }
    }

    #[test]
    fn nested_collections_convert_recursively() {
        let value = SbValue::Map(BTreeMap::from([(
            "blocks".to_string(),
            SbValue::Array(vec![SbValue::Int(1), SbValue::Map(BTreeMap::new())]),
        )]));
        let dynamic = value_to_dynamic(&value);
        assert!(dynamic.is::<Map>());
        assert_eq!(dynamic_to_value(dynamic).expect("convert back"), value);
    }

    #[test]
    fn chars_become_strings() {
        assert_eq!(
            dynamic_to_value(Dynamic::from('x')).expect("char"),
            SbValue::String("x".to_string())
        );
    }

    #[test]
    fn unsupported_types_are_reported() {
        #[derive(Clone)]
        struct Opaque;

        let failure = dynamic_to_value(Dynamic::from(Opaque)).expect_err("opaque value");
        assert!(failure.message().starts_with("Unsupported script value type"));
    }

    #[test]
    fn messages_unquote_strings() {
        assert_eq!(dynamic_message(&Dynamic::from("boom")), "boom");
        assert_eq!(dynamic_message(&Dynamic::from_int(42)), "42");
    }

    #[test]
    fn position_frame_copies_line_and_column() {
        let frame = position_frame("job.rhai", Position::new(4, 2));
        assert_eq!(frame.source, "job.rhai");
        assert_eq!(frame.line, Some(4));
        assert_eq!(frame.column, Some(2));
        assert_eq!(position_frame("x", Position::NONE).line, None);
    }
}
