use anyhow::{Context, Result};
use serde::Serialize;

/// Emit a value as JCS-canonical JSON (RFC 8785).
///
/// Object keys are sorted and numbers normalized, so the same view always produces
/// the same bytes regardless of field order in the source struct.
///
/// # Example
///
/// ```rust
/// use sdlcflow::emit_jcs;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Summary {
///     phase: &'static str,
///     pending: bool,
/// }
///
/// let json = emit_jcs(&Summary { phase: "analysis", pending: true }).unwrap();
/// assert_eq!(json, r#"{"pending":true,"phase":"analysis"}"#);
/// ```
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String> {
    let json_value =
        serde_json::to_value(value).with_context(|| "Failed to serialize value to JSON")?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .with_context(|| "Failed to canonicalize JSON using JCS")?;
    String::from_utf8(json_bytes).with_context(|| "JCS output contained invalid UTF-8")
}
