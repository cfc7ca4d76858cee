// Galaxy - server-side rendering for async components
//
// This crate ties together the rendering pipeline, the single-flight render
// cache and the host boundary types. Optional view engines sit behind
// features.

// Re-export core functionality
pub use galaxy_core::*;

// Rendering pipeline
pub use galaxy_ssr::{
    CacheOptions, ComponentLoader, ComponentModule, ComponentRef, ComponentRegistry, ErrorCallback,
    Fragment, Galaxy, GalaxyBuilder, GalaxyError, GalaxyHandler, HandlerOptions, Layout,
    LayoutSpec, LoadedComponent, PluginAttributes, PluginOptions, Props, RenderError, Renderer,
    ReplyOptions, compose, default_layout, props_from_value, resolve,
};

pub use galaxy_cache;
pub use galaxy_log;
pub use galaxy_ssr;

#[cfg(feature = "handlebars")]
pub use galaxy_handlebars;

/// Prelude for common imports.
///
/// ```
/// use galaxy::prelude::*;
///
/// let galaxy = Galaxy::register(PluginOptions::new()).unwrap();
/// assert!(!galaxy.has_view_engine());
/// ```
pub mod prelude {
    pub use galaxy_core::{HttpRequest, HttpResponse, RequestHandler, ViewEngine};
    pub use galaxy_ssr::prelude::*;

    #[cfg(feature = "handlebars")]
    pub use galaxy_handlebars::{HandlebarsConfig, HandlebarsService};
}
