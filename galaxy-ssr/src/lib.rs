//! Server-side rendering for Galaxy.
//!
//! Galaxy renders an async component into a complete HTML document. A
//! request flows through four steps:
//!
//! 1. **Resolve** the component reference (a [`Renderer`], a module with a
//!    default export, or a name registered in a [`ComponentRegistry`]).
//! 2. **Render** it with the effective props and request path, through the
//!    single-flight render cache when one is configured.
//! 3. **Compose** the fragment with a layout (the default HTML document, a
//!    custom function, or none) or hand it to a named view.
//! 4. **Respond** with the document, or with a 500 error response.
//!
//! ## Quick Start
//!
//! ```
//! use galaxy_ssr::{Galaxy, HandlerOptions, PluginOptions, Props, RenderError, Renderer};
//! use galaxy_core::{HttpRequest, RequestHandler};
//! use serde_json::{json, Value};
//!
//! # tokio_test::block_on(async {
//! let about = Renderer::new(|props: Props, _path: String| async move {
//!     let msg = props.get("msg").and_then(Value::as_str).unwrap_or("").to_string();
//!     Ok::<_, RenderError>(format!("<h1>{}</h1>", msg))
//! });
//!
//! let galaxy = Galaxy::register(PluginOptions::new()).unwrap();
//! let handler = galaxy.handler(HandlerOptions::new(about)).unwrap();
//!
//! let request = HttpRequest::get("/about").with_pre("props", json!({"msg": "hi"}));
//! let response = handler.handle(request).await.unwrap();
//!
//! assert_eq!(response.status, 200);
//! assert!(response.text().contains(r#"<div id="__galaxy"><h1>hi</h1></div>"#));
//! # });
//! ```
//!
//! ## Caching
//!
//! ```
//! use galaxy_ssr::{CacheOptions, Galaxy, LayoutSpec, PluginOptions};
//!
//! let galaxy = Galaxy::register(
//!     PluginOptions::new()
//!         .with_cache(CacheOptions::from_millis(60_000, 500))
//!         .with_layout(LayoutSpec::Disabled),
//! )
//! .unwrap();
//!
//! assert!(galaxy.cache().is_some());
//! ```
//!
//! ## Options from files
//!
//! ```no_run
//! use galaxy_ssr::PluginOptions;
//!
//! let options = PluginOptions::from_file("config/galaxy.toml").unwrap();
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod layout;
pub mod service;
pub mod validation;

pub use component::{
    ComponentLoader, ComponentModule, ComponentRef, ComponentRegistry, Fragment, LoadedComponent,
    Props, Renderer, resolve,
};
pub use config::{
    CacheOptions, ErrorCallback, HandlerOptions, PluginOptions, ReplyOptions, props_from_value,
};
pub use error::{GalaxyError, RenderError, Result};
pub use layout::{Layout, LayoutSpec, compose, default_layout};
pub use service::{Galaxy, GalaxyBuilder, GalaxyHandler, PluginAttributes};
pub use validation::{validate_layout, validate_view};

pub mod prelude {
    pub use crate::component::{ComponentModule, ComponentRef, ComponentRegistry, Props, Renderer};
    pub use crate::config::{CacheOptions, HandlerOptions, PluginOptions, ReplyOptions};
    pub use crate::error::{GalaxyError, RenderError};
    pub use crate::layout::LayoutSpec;
    pub use crate::service::{Galaxy, GalaxyHandler};
}
