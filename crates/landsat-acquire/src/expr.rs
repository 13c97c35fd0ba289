//! Builders for Earth Engine expression graphs.
//!
//! The REST API takes a computation as a tree of value nodes: constants,
//! function invocations whose arguments are themselves value nodes, and a
//! root. Everything here produces plain `serde_json::Value`s in that shape.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// A constant value node.
pub fn constant<T: Serialize>(value: T) -> Value {
    json!({ "constantValue": value })
}

/// A function invocation node with named arguments.
pub fn invoke(function: &str, arguments: Vec<(&str, Value)>) -> Value {
    let arguments: Map<String, Value> = arguments
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

/// Wrap a root node into a complete expression.
pub fn expression(root: Value) -> Value {
    json!({
        "result": "0",
        "values": { "0": root },
    })
}

/// Name of the function invoked by `node`, if it is an invocation.
pub fn function_name(node: &Value) -> Option<&str> {
    node.get("functionInvocationValue")?
        .get("functionName")?
        .as_str()
}

/// Argument `name` of an invocation node.
pub fn argument<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    node.get("functionInvocationValue")?.get("arguments")?.get(name)
}
