//! Client hydration state.
//!
//! Server-rendered markup is paired with the properties it was rendered from
//! so the client can pick up where the server left off. The properties are
//! written into an inline `<script>` as a JSON literal, which means any
//! user-controlled string inside them could close the script tag early.
//! [`serialize_state`] escapes the characters that matter for that.

use crate::Error;
use serde::Serialize;

/// `id` of the element the rendered fragment is mounted in.
pub const CONTAINER_ID: &str = "__galaxy";

/// Global object on `window` that carries the hydration state.
pub const STATE_GLOBAL: &str = "GALAXY";

/// Serialize `state` as JSON that is safe to inline inside `<script>`.
///
/// `<`, `>` and `&` become unicode escapes so no `</script>` or `<!--`
/// sequence survives; U+2028 and U+2029 are escaped because they terminate
/// JavaScript string literals in older engines. The output is still valid
/// JSON and parses back to the same value.
pub fn serialize_state<T: Serialize + ?Sized>(state: &T) -> Result<String, Error> {
    let json = serde_json::to_string(state)?;
    let mut escaped = String::with_capacity(json.len() + 16);

    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }

    Ok(escaped)
}

/// The inline script that publishes `state` as `window.GALAXY.__galaxy`.
pub fn hydration_script<T: Serialize + ?Sized>(state: &T) -> Result<String, Error> {
    Ok(format!(
        "<script>window.{} = {{ {}: ({}) }};</script>",
        STATE_GLOBAL,
        CONTAINER_ID,
        serialize_state(state)?
    ))
}
