//! Render fingerprints.
//!
//! A fingerprint is `hex(sha256(identity, canonical props)) + path`. Props are
//! canonicalized with object keys sorted at every depth, so two structurally
//! equal values hash the same whatever order their keys were inserted in.

use crate::error::CacheResult;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Cache key for one rendered fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a render of the component identified by `identity`.
    ///
    /// ```
    /// use galaxy_cache::Fingerprint;
    /// use serde_json::json;
    ///
    /// let a = Fingerprint::compute("about", &json!({"a": 1, "b": 2}), "/about").unwrap();
    /// let b = Fingerprint::compute("about", &json!({"b": 2, "a": 1}), "/about").unwrap();
    /// assert_eq!(a, b);
    /// assert!(a.as_str().ends_with("/about"));
    /// ```
    pub fn compute<P>(identity: &str, props: &P, path: &str) -> CacheResult<Self>
    where
        P: Serialize + ?Sized,
    {
        let value = serde_json::to_value(props)?;
        let mut canonical = String::new();
        write_canonical(&value, &mut canonical)?;

        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hasher.update([0u8]);
        hasher.update(canonical.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Ok(Self(format!("{}{}", digest, path)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn write_canonical(value: &Value, out: &mut String) -> CacheResult<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(val, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fp(identity: &str, props: Value, path: &str) -> Fingerprint {
        Fingerprint::compute(identity, &props, path).unwrap()
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a = fp("c", json!({"outer": {"x": 1, "y": [1, {"p": 1, "q": 2}]}, "z": null}), "/");
        let b = fp("c", json!({"z": null, "outer": {"y": [1, {"q": 2, "p": 1}], "x": 1}}), "/");
        assert_eq!(a, b);
    }

    #[test]
    fn test_array_order_matters() {
        assert_ne!(fp("c", json!({"l": [1, 2]}), ""), fp("c", json!({"l": [2, 1]}), ""));
    }

    #[test]
    fn test_identity_props_and_path_all_count() {
        let base = fp("c", json!({"msg": "hi"}), "/a");
        assert_ne!(base, fp("d", json!({"msg": "hi"}), "/a"));
        assert_ne!(base, fp("c", json!({"msg": "ho"}), "/a"));
        assert_ne!(base, fp("c", json!({"msg": "hi"}), "/b"));
    }

    #[test]
    fn test_layout() {
        let key = fp("c", json!({}), "/about");
        let (digest, path) = key.as_str().split_at(64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(path, "/about");

        let bare = fp("c", json!({}), "");
        assert_eq!(bare.as_str().len(), 64);
    }

    #[test]
    fn test_canonical_form() {
        let mut out = String::new();
        write_canonical(&json!({"b": "x\"y", "a": [true, 1.5]}), &mut out).unwrap();
        assert_eq!(out, r#"{"a":[true,1.5],"b":"x\"y"}"#);
    }
}
