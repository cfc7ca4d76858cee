// Galaxy plugin, handler and reply options

use crate::component::{ComponentRef, Props};
use crate::error::{GalaxyError, Result};
use crate::layout::LayoutSpec;
use galaxy_cache::RenderCacheConfig;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Called with the failure when a reply cannot be rendered.
pub type ErrorCallback = Arc<dyn Fn(&GalaxyError) + Send + Sync>;

/// Render cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// How long a rendered fragment is reused
    pub expires_in: Duration,

    /// Longest a request waits for a fresh render
    pub generate_timeout: Duration,
}

impl CacheOptions {
    pub fn new(expires_in: Duration, generate_timeout: Duration) -> Self {
        Self {
            expires_in,
            generate_timeout,
        }
    }

    pub fn from_millis(expires_in: u64, generate_timeout: u64) -> Self {
        Self::new(
            Duration::from_millis(expires_in),
            Duration::from_millis(generate_timeout),
        )
    }

    pub(crate) fn to_cache_config(self) -> Result<RenderCacheConfig> {
        RenderCacheConfig::new(self.expires_in, self.generate_timeout)
            .map(|config| config.with_key_prefix("galaxy"))
            .map_err(|e| GalaxyError::Config(e.to_string()))
    }
}

/// Plugin-wide options.
///
/// ```
/// use galaxy_ssr::{CacheOptions, LayoutSpec, PluginOptions};
///
/// let options = PluginOptions::new()
///     .with_cache(CacheOptions::from_millis(60_000, 500))
///     .with_layout(LayoutSpec::Disabled);
///
/// assert!(options.cache.is_some());
/// assert!(options.view.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PluginOptions {
    /// No cache means every request renders
    pub cache: Option<CacheOptions>,
    pub layout: LayoutSpec,
    pub view: Option<String>,
}

impl PluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_layout(mut self, layout: LayoutSpec) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }
}

/// Options for a route handler.
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    pub component: ComponentRef,
    /// Used when the request carries no pre-computed props
    pub props: Option<Props>,
    pub layout: Option<LayoutSpec>,
    pub view: Option<String>,
}

impl HandlerOptions {
    pub fn new(component: impl Into<ComponentRef>) -> Self {
        Self {
            component: component.into(),
            props: None,
            layout: None,
            view: None,
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    pub fn with_layout(mut self, layout: LayoutSpec) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }
}

/// Options for a single reply.
#[derive(Clone, Default)]
pub struct ReplyOptions {
    pub props: Option<Props>,
    pub path: Option<String>,
    pub layout: Option<LayoutSpec>,
    pub view: Option<String>,
    pub on_error: Option<ErrorCallback>,
}

impl ReplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_layout(mut self, layout: LayoutSpec) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Observe the failure before it is turned into an error response.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&GalaxyError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for ReplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyOptions")
            .field("props", &self.props)
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("view", &self.view)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Convert a JSON value into props; only objects qualify.
pub fn props_from_value(value: Value) -> Result<Props> {
    match value {
        Value::Object(props) => Ok(props),
        other => Err(GalaxyError::Config(format!(
            "props must be an object, got {}",
            json_type(&other)
        ))),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cache_options_validation() {
        assert!(CacheOptions::from_millis(1_000, 100).to_cache_config().is_ok());

        let err = CacheOptions::from_millis(1_000, 0)
            .to_cache_config()
            .unwrap_err();
        assert!(err.is_setup_error());
        assert!(err.to_string().contains("generateTimeout"));
    }

    #[test]
    fn test_cache_keys_are_namespaced() {
        let config = CacheOptions::from_millis(1_000, 100).to_cache_config().unwrap();
        assert_eq!(config.build_key("abc"), "galaxy:abc");
    }

    #[test]
    fn test_handler_options_builder() {
        let options = HandlerOptions::new("pages/about")
            .with_props(props_from_value(json!({"msg": "bar"})).unwrap())
            .with_view("layouts/main");

        assert!(matches!(options.component, ComponentRef::Named(ref id) if id == "pages/about"));
        assert_eq!(options.props.unwrap()["msg"], "bar");
        assert_eq!(options.view.as_deref(), Some("layouts/main"));
        assert!(options.layout.is_none());
    }

    #[test]
    fn test_reply_options_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let options = ReplyOptions::new()
            .with_path("/about")
            .on_error(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let callback = options.on_error.clone().unwrap();
        callback(&GalaxyError::Render("x".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(format!("{:?}", options).contains("on_error: true"));
    }

    #[test]
    fn test_props_from_value() {
        assert!(props_from_value(json!({})).unwrap().is_empty());

        let err = props_from_value(json!(["a"])).unwrap_err();
        assert_eq!(err.to_string(), "props must be an object, got array");
    }
}
