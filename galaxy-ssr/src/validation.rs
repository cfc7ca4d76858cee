//! Options from loosely-typed sources.
//!
//! Typed option structs cannot be malformed, but options read from JSON or
//! TOML can. These loaders check the shape of every field and reject unknown
//! keys. Functions cannot be serialized, so a serialized `layout` may only be
//! `false` and a serialized `component` may only be a registered identifier.

use crate::component::ComponentRef;
use crate::config::{
    CacheOptions, HandlerOptions, PluginOptions, ReplyOptions, json_type, props_from_value,
};
use crate::error::{GalaxyError, Result};
use crate::layout::LayoutSpec;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

const LAYOUT_ERROR: &str = "layout must be a function or false";
const COMPONENT_ERROR: &str = "component must be a function, string, or module";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPluginOptions {
    cache: Option<RawCacheOptions>,
    layout: Option<Value>,
    view: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawCacheOptions {
    expires_in: u64,
    generate_timeout: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHandlerOptions {
    component: Option<Value>,
    props: Option<Value>,
    layout: Option<Value>,
    view: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReplyOptions {
    props: Option<Value>,
    path: Option<Value>,
    layout: Option<Value>,
    view: Option<Value>,
}

fn parse<T: for<'de> Deserialize<'de>>(value: Value, what: &str) -> Result<T> {
    if !value.is_object() {
        return Err(GalaxyError::Config(format!(
            "{} options must be an object, got {}",
            what,
            json_type(&value)
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| GalaxyError::Config(format!("invalid {} options: {}", what, e)))
}

/// `layout`: absent, or `false` to disable layouts.
pub fn validate_layout(value: Option<Value>) -> Result<Option<LayoutSpec>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(false)) => Ok(Some(LayoutSpec::Disabled)),
        Some(_) => Err(GalaxyError::Config(LAYOUT_ERROR.to_string())),
    }
}

/// `view`: absent, or a view name.
pub fn validate_view(value: Option<Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(view)) => Ok(Some(view)),
        Some(other) => Err(GalaxyError::Config(format!(
            "view must be a string, got {}",
            json_type(&other)
        ))),
    }
}

fn validate_props(value: Option<Value>) -> Result<Option<crate::Props>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => props_from_value(value).map(Some),
    }
}

fn validate_component(value: Option<Value>) -> Result<ComponentRef> {
    match value {
        Some(Value::String(id)) => Ok(ComponentRef::Named(id)),
        _ => Err(GalaxyError::Config(COMPONENT_ERROR.to_string())),
    }
}

impl PluginOptions {
    /// Validate plugin options given as JSON.
    ///
    /// ```
    /// use galaxy_ssr::PluginOptions;
    /// use serde_json::json;
    ///
    /// let options = PluginOptions::from_value(json!({
    ///     "cache": {"expiresIn": 60000, "generateTimeout": 500},
    ///     "layout": false
    /// })).unwrap();
    /// assert!(options.layout.is_disabled());
    ///
    /// let err = PluginOptions::from_value(json!({"layout": "main"})).unwrap_err();
    /// assert_eq!(err.to_string(), "layout must be a function or false");
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawPluginOptions = parse(value, "plugin")?;

        let cache = match raw.cache {
            Some(cache) => {
                let options = CacheOptions::from_millis(cache.expires_in, cache.generate_timeout);
                options.to_cache_config()?;
                Some(options)
            }
            None => None,
        };

        Ok(Self {
            cache,
            layout: validate_layout(raw.layout)?.unwrap_or_default(),
            view: validate_view(raw.view)?,
        })
    }

    /// Load plugin options from a `.json` or `.toml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                GalaxyError::Config(format!("no file extension on {}", path.display()))
            })?;

        let content = fs::read_to_string(path).map_err(|e| {
            GalaxyError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let value = match ext.as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| GalaxyError::Config(format!("JSON parse error: {}", e)))?,
            "toml" => {
                let table: toml::Table = toml::from_str(&content)
                    .map_err(|e| GalaxyError::Config(format!("TOML parse error: {}", e)))?;
                serde_json::to_value(table)?
            }
            other => {
                return Err(GalaxyError::Config(format!(
                    "unsupported options format: {}",
                    other
                )));
            }
        };

        Self::from_value(value)
    }
}

impl HandlerOptions {
    /// Validate handler options given as JSON. `component` must name a
    /// registered component.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawHandlerOptions = parse(value, "handler")?;

        Ok(Self {
            component: validate_component(raw.component)?,
            props: validate_props(raw.props)?,
            layout: validate_layout(raw.layout)?,
            view: validate_view(raw.view)?,
        })
    }
}

impl ReplyOptions {
    /// Validate reply options given as JSON.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawReplyOptions = parse(value, "reply")?;

        let path = match raw.path {
            None | Some(Value::Null) => None,
            Some(Value::String(path)) => Some(path),
            Some(other) => {
                return Err(GalaxyError::Config(format!(
                    "path must be a string, got {}",
                    json_type(&other)
                )));
            }
        };

        Ok(Self {
            props: validate_props(raw.props)?,
            path,
            layout: validate_layout(raw.layout)?,
            view: validate_view(raw.view)?,
            on_error: None,
        })
    }
}
