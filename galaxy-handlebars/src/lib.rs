//! Handlebars view engine for Galaxy.
//!
//! When a Galaxy handler names a `view`, the rendered fragment is handed to
//! the registered [`ViewEngine`](galaxy_core::ViewEngine) instead of the
//! built-in layout. This crate provides that engine on top of Handlebars.
//!
//! Views receive a context of `{ content, props }`: `content` is the rendered
//! fragment (insert it unescaped with `{{{content}}}`) and `props` the
//! properties it was rendered from.
//!
//! ## Example
//!
//! ```no_run
//! use galaxy_handlebars::{HandlebarsConfig, HandlebarsService};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HandlebarsService::new(HandlebarsConfig::new("views"))?;
//!
//! let html = service
//!     .render("layouts/main", &json!({"content": "<p>hi</p>", "props": {}}))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## View Example
//!
//! ```handlebars
//! <html>
//!   <head><title>{{default props.title "Galaxy"}}</title></head>
//!   <body>
//!     <div id="__galaxy">{{{content}}}</div>
//!     {{hydrate props}}
//!   </body>
//! </html>
//! ```
//!
//! ## Built-in Helpers
//!
//! - `hydrate`: the client hydration `<script>` for a value
//! - `json`: JSON that is safe to inline in a `<script>`
//! - `default`: a fallback for null or empty values

pub mod config;
pub mod engine;
pub mod error;
pub mod helpers;

pub use config::HandlebarsConfig;
pub use engine::HandlebarsEngine;
pub use error::{HandlebarsError, Result};

use async_trait::async_trait;
use galaxy_core::ViewEngine;
use serde::Serialize;
use serde_json::Value;

/// Async front for [`HandlebarsEngine`]; rendering runs on the blocking pool.
#[derive(Clone)]
pub struct HandlebarsService {
    engine: HandlebarsEngine,
}

impl HandlebarsService {
    pub fn new(config: HandlebarsConfig) -> Result<Self> {
        let engine = HandlebarsEngine::new(config)?;
        Ok(Self { engine })
    }

    /// Render a registered view.
    pub async fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        let engine = self.engine.clone();
        let name = name.to_string();
        let data = serde_json::to_value(data)?;

        tokio::task::spawn_blocking(move || engine.render(&name, &data))
            .await
            .map_err(|e| HandlebarsError::RenderError(e.to_string()))?
    }

    pub async fn render_template<T: Serialize>(&self, source: &str, data: &T) -> Result<String> {
        let engine = self.engine.clone();
        let source = source.to_string();
        let data = serde_json::to_value(data)?;

        tokio::task::spawn_blocking(move || engine.render_template(&source, &data))
            .await
            .map_err(|e| HandlebarsError::RenderError(e.to_string()))?
    }

    pub fn register_template(&self, name: &str, source: &str) -> Result<()> {
        self.engine.register_template(name, source)
    }

    pub fn register_partial(&self, name: &str, source: &str) -> Result<()> {
        self.engine.register_partial(name, source)
    }

    pub fn register_helper<F>(&self, name: &str, helper: F)
    where
        F: handlebars::HelperDef + Send + Sync + 'static,
    {
        self.engine.register_helper(name, helper)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    pub async fn reload_templates(&self) -> Result<()> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.reload_templates())
            .await
            .map_err(|e| HandlebarsError::RenderError(e.to_string()))?
    }

    pub fn config(&self) -> &HandlebarsConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &HandlebarsEngine {
        &self.engine
    }
}

#[async_trait]
impl ViewEngine for HandlebarsService {
    async fn render_view(
        &self,
        name: &str,
        context: &Value,
    ) -> std::result::Result<String, galaxy_core::Error> {
        Ok(self.render(name, context).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> HandlebarsService {
        let service = HandlebarsService::new(HandlebarsConfig::in_memory()).unwrap();
        service
            .register_template(
                "layout",
                "<title>{{default props.title \"Galaxy\"}}</title><div id=\"__galaxy\">{{{content}}}</div>",
            )
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_service_render() {
        let html = service()
            .render(
                "layout",
                &json!({"content": "<h1>Hi</h1>", "props": {"title": "Home"}}),
            )
            .await
            .unwrap();
        assert_eq!(html, "<title>Home</title><div id=\"__galaxy\"><h1>Hi</h1></div>");
    }

    #[tokio::test]
    async fn test_view_engine_impl() {
        let engine: &dyn ViewEngine = &service();
        let html = engine
            .render_view("layout", &json!({"content": "x", "props": {}}))
            .await
            .unwrap();
        assert_eq!(html, "<title>Galaxy</title><div id=\"__galaxy\">x</div>");
    }

    #[tokio::test]
    async fn test_view_engine_missing_view_is_view_error() {
        let engine: &dyn ViewEngine = &service();
        let err = engine
            .render_view("missing", &json!({"content": "", "props": {}}))
            .await
            .unwrap_err();

        assert!(matches!(err, galaxy_core::Error::View(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_render_template_string() {
        let html = service()
            .render_template("{{json props}}", &json!({"props": {"a": 1}}))
            .await
            .unwrap();
        assert_eq!(html, r#"{"a":1}"#);
    }
}
