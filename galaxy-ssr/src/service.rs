// Galaxy plugin: route handlers and replies

use crate::component::{ComponentLoader, ComponentRef, Props, Renderer, resolve};
use crate::config::{HandlerOptions, PluginOptions, ReplyOptions, props_from_value};
use crate::error::{GalaxyError, RenderError, Result};
use crate::layout::{LayoutSpec, compose};
use async_trait::async_trait;
use galaxy_cache::{CacheStatus, Fingerprint, RenderCache};
use galaxy_core::{Error, HttpRequest, HttpResponse, RequestHandler, ViewEngine};
use serde_json::Value;
use std::sync::Arc;

/// Name and version the plugin registers under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginAttributes {
    pub name: &'static str,
    pub version: &'static str,
}

/// Assembles a [`Galaxy`] from options and the host's collaborators.
#[derive(Default)]
pub struct GalaxyBuilder {
    options: PluginOptions,
    loader: Option<Arc<dyn ComponentLoader>>,
    views: Option<Arc<dyn ViewEngine>>,
}

impl GalaxyBuilder {
    pub fn options(mut self, options: PluginOptions) -> Self {
        self.options = options;
        self
    }

    /// Where named components are looked up.
    pub fn loader(mut self, loader: impl ComponentLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn view_engine(mut self, views: impl ViewEngine + 'static) -> Self {
        self.views = Some(Arc::new(views));
        self
    }

    pub fn shared_view_engine(mut self, views: Arc<dyn ViewEngine>) -> Self {
        self.views = Some(views);
        self
    }

    /// Validate the options and create the plugin.
    ///
    /// Fails when a plugin-level view is configured without a view engine or
    /// the cache settings are invalid.
    pub fn register(self) -> Result<Galaxy> {
        let GalaxyBuilder {
            options,
            loader,
            views,
        } = self;

        if let Some(view) = &options.view {
            if views.is_none() {
                return Err(GalaxyError::ViewEngineMissing { view: view.clone() });
            }
        }

        let cache = match options.cache {
            Some(cache) => Some(RenderCache::new(cache.to_cache_config()?)),
            None => None,
        };

        galaxy_log::info!(
            "galaxy {} registered (cache: {}, layout: {:?}, view: {})",
            Galaxy::VERSION,
            if cache.is_some() { "enabled" } else { "disabled" },
            options.layout,
            options.view.as_deref().unwrap_or("none")
        );

        Ok(Galaxy {
            inner: Arc::new(Inner {
                layout: options.layout,
                view: options.view,
                cache,
                loader,
                views,
            }),
        })
    }
}

struct Inner {
    layout: LayoutSpec,
    view: Option<String>,
    cache: Option<RenderCache<RenderError>>,
    loader: Option<Arc<dyn ComponentLoader>>,
    views: Option<Arc<dyn ViewEngine>>,
}

/// The rendering plugin.
///
/// Cheap to clone; clones share the render cache.
#[derive(Clone)]
pub struct Galaxy {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Galaxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Galaxy")
            .field("layout", &self.inner.layout)
            .field("view", &self.inner.view)
            .finish_non_exhaustive()
    }
}

impl Galaxy {
    pub const NAME: &'static str = "galaxy";
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn builder() -> GalaxyBuilder {
        GalaxyBuilder::default()
    }

    /// Register with options only: no component loader and no view engine.
    pub fn register(options: PluginOptions) -> Result<Self> {
        Self::builder().options(options).register()
    }

    pub fn attributes() -> PluginAttributes {
        PluginAttributes {
            name: Self::NAME,
            version: Self::VERSION,
        }
    }

    /// The shared render cache, if caching is configured.
    pub fn cache(&self) -> Option<&RenderCache<RenderError>> {
        self.inner.cache.as_ref()
    }

    pub fn has_view_engine(&self) -> bool {
        self.inner.views.is_some()
    }

    /// Build the handler for one route. The component is resolved now, so a
    /// bad reference fails route setup rather than the first request.
    pub fn handler(&self, options: HandlerOptions) -> Result<GalaxyHandler> {
        let HandlerOptions {
            component,
            props,
            layout,
            view,
        } = options;

        let view = view.or_else(|| self.inner.view.clone());
        if let Some(view) = &view {
            if self.inner.views.is_none() {
                return Err(GalaxyError::ViewEngineMissing { view: view.clone() });
            }
        }

        let renderer = resolve(&component, self.inner.loader.as_deref())?;
        let layout = layout.unwrap_or_else(|| self.inner.layout.clone());

        galaxy_log::debug!(
            "galaxy handler for {} (view: {})",
            renderer.id(),
            view.as_deref().unwrap_or("none")
        );

        Ok(GalaxyHandler {
            galaxy: self.clone(),
            renderer,
            props,
            layout,
            view,
        })
    }

    /// Render `component` and build the response.
    ///
    /// Failures are passed to the `on_error` callback, if any, and become a
    /// 500 response.
    pub async fn reply(
        &self,
        component: impl Into<ComponentRef>,
        options: ReplyOptions,
    ) -> HttpResponse {
        let on_error = options.on_error.clone();

        match self.render(component, options).await {
            Ok(document) => HttpResponse::html(document),
            Err(err) => {
                if let Some(callback) = on_error {
                    callback(&err);
                }
                error_response(err)
            }
        }
    }

    /// Render `component` into a document without building a response.
    ///
    /// Without a layout in `options` the default layout is used; the
    /// plugin-level layout applies to route handlers only.
    pub async fn render(
        &self,
        component: impl Into<ComponentRef>,
        options: ReplyOptions,
    ) -> Result<String> {
        let renderer = resolve(&component.into(), self.inner.loader.as_deref())?;

        let ReplyOptions {
            props,
            path,
            layout,
            view,
            ..
        } = options;

        let layout = layout.unwrap_or_default();
        let view = view.or_else(|| self.inner.view.clone());

        self.render_document(
            &renderer,
            props.unwrap_or_default(),
            path.unwrap_or_default(),
            &layout,
            view.as_deref(),
        )
        .await
    }

    async fn render_document(
        &self,
        renderer: &Renderer,
        props: Props,
        path: String,
        layout: &LayoutSpec,
        view: Option<&str>,
    ) -> Result<String> {
        let (fragment, status) = self.render_fragment(renderer, &props, path).await?;
        galaxy_log::debug!("rendered {} ({})", renderer.id(), status);

        compose(&props, fragment, layout, view, self.inner.views.as_deref()).await
    }

    async fn render_fragment(
        &self,
        renderer: &Renderer,
        props: &Props,
        path: String,
    ) -> Result<(String, CacheStatus)> {
        let Some(cache) = &self.inner.cache else {
            let fragment = renderer.render(props.clone(), path).await?;
            return Ok((fragment, CacheStatus::Bypass));
        };

        let fingerprint = Fingerprint::compute(renderer.id(), props, &path)?;
        let rendered = cache
            .get_or_render(&fingerprint, || renderer.render(props.clone(), path))
            .await?;

        Ok(rendered)
    }
}

fn error_response(err: GalaxyError) -> HttpResponse {
    galaxy_log::error!("galaxy render failed: {}", err);
    let err: Error = err.into();
    HttpResponse::from_error(&err)
}

/// Route handler produced by [`Galaxy::handler`].
pub struct GalaxyHandler {
    galaxy: Galaxy,
    renderer: Renderer,
    props: Option<Props>,
    layout: LayoutSpec,
    view: Option<String>,
}

impl GalaxyHandler {
    /// Request-scoped `pre["props"]` wins over the configured props.
    fn props_for(&self, request: &HttpRequest) -> Result<Props> {
        match request.pre("props") {
            Some(Value::Null) | None => Ok(self.props.clone().unwrap_or_default()),
            Some(value) => props_from_value(value.clone()),
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    async fn document(&self, request: &HttpRequest) -> Result<String> {
        let props = self.props_for(request)?;
        self.galaxy
            .render_document(
                &self.renderer,
                props,
                request.path.clone(),
                &self.layout,
                self.view.as_deref(),
            )
            .await
    }
}

#[async_trait]
impl RequestHandler for GalaxyHandler {
    async fn handle(&self, request: HttpRequest) -> std::result::Result<HttpResponse, Error> {
        match self.document(&request).await {
            Ok(document) => Ok(HttpResponse::html(document)),
            Err(err) => Ok(error_response(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentModule, ComponentRegistry};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn props(value: Value) -> Props {
        props_from_value(value).unwrap()
    }

    /// Renders `<p>{msg}</p>` and counts invocations.
    fn counting(calls: &Arc<AtomicUsize>) -> Renderer {
        let calls = Arc::clone(calls);
        Renderer::new(move |props: Props, _path: String| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let msg = props.get("msg").and_then(Value::as_str).unwrap_or("");
                Ok::<_, RenderError>(format!("<p>{}</p>", msg))
            }
        })
    }

    fn failing() -> Renderer {
        Renderer::new(|_: Props, _: String| async {
            Err::<String, _>(RenderError::new("Render error!"))
        })
    }

    fn echo_path() -> Renderer {
        Renderer::new(|_: Props, path: String| async move { Ok::<_, RenderError>(path) })
    }

    struct Views;

    #[async_trait]
    impl ViewEngine for Views {
        async fn render_view(
            &self,
            name: &str,
            context: &Value,
        ) -> std::result::Result<String, Error> {
            Ok(format!(
                "<{name}>{}</{name}>",
                context["content"].as_str().unwrap_or_default()
            ))
        }
    }

    fn raw() -> ReplyOptions {
        ReplyOptions::new().with_layout(LayoutSpec::Disabled)
    }

    fn no_layout() -> Galaxy {
        Galaxy::register(PluginOptions::new().with_layout(LayoutSpec::Disabled)).unwrap()
    }

    #[test]
    fn test_attributes() {
        let attrs = Galaxy::attributes();
        assert_eq!(attrs.name, "galaxy");
        assert_eq!(attrs.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_plugin_view_requires_engine() {
        let err = Galaxy::register(PluginOptions::new().with_view("layouts/main"))
            .err()
            .unwrap();
        assert!(err.is_setup_error());
        assert!(err.to_string().contains("layouts/main"));

        let ok = Galaxy::builder()
            .options(PluginOptions::new().with_view("layouts/main"))
            .view_engine(Views)
            .register();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_handler_view_requires_engine() {
        let calls = Arc::new(AtomicUsize::new(0));
        let galaxy = no_layout();

        let err = galaxy
            .handler(HandlerOptions::new(counting(&calls)).with_view("page"))
            .err()
            .unwrap();
        assert!(matches!(err, GalaxyError::ViewEngineMissing { ref view } if view == "page"));
    }

    #[test]
    fn test_handler_resolution_failure_is_fatal() {
        let galaxy = Galaxy::builder()
            .loader(ComponentRegistry::new())
            .register()
            .unwrap();

        let err = galaxy.handler(HandlerOptions::new("pages/missing")).err().unwrap();
        assert!(matches!(err, GalaxyError::Resolution(_)));
    }

    #[tokio::test]
    async fn test_default_layout_document() {
        let calls = Arc::new(AtomicUsize::new(0));
        let galaxy = Galaxy::register(PluginOptions::new()).unwrap();

        let response = galaxy
            .reply(counting(&calls), ReplyOptions::new().with_props(props(json!({"msg": "hi"}))))
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("text/html; charset=utf-8")
        );
        let body = response.text();
        assert!(body.contains(r#"<div id="__galaxy"><p>hi</p></div>"#));
        assert!(body.contains(r#"window.GALAXY = { __galaxy: ({"msg":"hi"}) }"#));
    }

    #[tokio::test]
    async fn test_reply_defaults() {
        let galaxy = no_layout();
        let response = galaxy.reply(echo_path(), raw()).await;
        assert_eq!(response.text(), "");

        let response = galaxy
            .reply(echo_path(), raw().with_path("/about"))
            .await;
        assert_eq!(response.text(), "/about");
    }

    #[tokio::test]
    async fn test_reply_ignores_plugin_layout() {
        let galaxy = no_layout();
        let response = galaxy
            .reply(echo_path(), ReplyOptions::new().with_path("/doc"))
            .await;

        let expected = crate::layout::default_layout(&Props::new(), "/doc").unwrap();
        assert_eq!(response.text(), expected);

        let handler = galaxy.handler(HandlerOptions::new(echo_path())).unwrap();
        let routed = handler.handle(HttpRequest::get("/doc")).await.unwrap();
        assert_eq!(routed.text(), "/doc");
    }

    #[tokio::test]
    async fn test_reply_layout_overrides_plugin_layout() {
        let galaxy = no_layout();
        let layout = LayoutSpec::custom(|_, fragment| format!("<body>{}</body>", fragment));

        let response = galaxy
            .reply(echo_path(), ReplyOptions::new().with_path("/x").with_layout(layout))
            .await;
        assert_eq!(response.text(), "<body>/x</body>");
    }

    #[tokio::test]
    async fn test_reply_failure_invokes_callback_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let galaxy = no_layout();

        let response = galaxy
            .reply(
                failing(),
                ReplyOptions::new().on_error(move |err| {
                    let reason = err.render_error().map(RenderError::reason);
                    sink.lock().unwrap().push(reason);
                }),
            )
            .await;

        assert_eq!(response.status, 500);
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["statusCode"], 500);
        assert_eq!(body["message"], "An internal server error occurred");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[Some("Render error!".to_string())]);
    }

    #[tokio::test]
    async fn test_reply_view_without_engine_is_500() {
        let calls = Arc::new(AtomicUsize::new(0));
        let galaxy = no_layout();

        let response = galaxy
            .reply(counting(&calls), ReplyOptions::new().with_view("page"))
            .await;
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_view_takes_precedence_over_layout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let galaxy = Galaxy::builder()
            .options(PluginOptions::new().with_layout(LayoutSpec::custom(|_, _| "layout".into())))
            .view_engine(Views)
            .register()
            .unwrap();

        let response = galaxy
            .reply(
                counting(&calls),
                ReplyOptions::new()
                    .with_view("main")
                    .with_props(props(json!({"msg": "v"}))),
            )
            .await;
        assert_eq!(response.text(), "<main><p>v</p></main>");
    }

    #[tokio::test]
    async fn test_handler_pre_props_win() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = no_layout()
            .handler(
                HandlerOptions::new(counting(&calls)).with_props(props(json!({"msg": "bar"}))),
            )
            .unwrap();

        let plain = handler.handle(HttpRequest::get("/")).await.unwrap();
        assert_eq!(plain.text(), "<p>bar</p>");

        let request = HttpRequest::get("/").with_pre("props", json!({"msg": "foo"}));
        let pre = handler.handle(request).await.unwrap();
        assert_eq!(pre.text(), "<p>foo</p>");
    }

    #[tokio::test]
    async fn test_handler_rejects_non_object_pre_props() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = no_layout().handler(HandlerOptions::new(counting(&calls))).unwrap();

        let request = HttpRequest::get("/").with_pre("props", json!("foo"));
        let response = handler.handle(request).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_uses_request_path() {
        let handler = no_layout().handler(HandlerOptions::new(echo_path())).unwrap();
        let response = handler.handle(HttpRequest::get("/about")).await.unwrap();
        assert_eq!(response.text(), "/about");
    }

    #[tokio::test]
    async fn test_handler_failure_is_500() {
        let handler = no_layout().handler(HandlerOptions::new(failing())).unwrap();
        let response = handler.handle(HttpRequest::get("/")).await.unwrap();
        assert_eq!(response.status, 500);
        assert!(!response.text().contains("Render error!"));
    }

    #[tokio::test]
    async fn test_named_component_renders_like_direct() {
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = counting(&calls);
        let registry = ComponentRegistry::new()
            .with_module("pages/home", ComponentModule::with_default(renderer.clone()));
        let galaxy = Galaxy::builder()
            .options(PluginOptions::new().with_layout(LayoutSpec::Disabled))
            .loader(registry)
            .register()
            .unwrap();

        let options = || raw().with_props(props(json!({"msg": "same"})));
        let named = galaxy.reply("pages/home", options()).await;
        let direct = galaxy.reply(renderer, options()).await;

        assert_eq!(named.text(), direct.text());
        assert_eq!(named.text(), "<p>same</p>");
    }

    #[tokio::test]
    async fn test_unknown_named_component_reply_is_500() {
        let galaxy = Galaxy::builder()
            .loader(ComponentRegistry::new())
            .register()
            .unwrap();
        let response = galaxy.reply("nope", ReplyOptions::new()).await;
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_without_cache_every_request_renders() {
        let calls = Arc::new(AtomicUsize::new(0));
        let galaxy = no_layout();
        assert!(galaxy.cache().is_none());

        for _ in 0..3 {
            galaxy.reply(counting(&calls), ReplyOptions::new()).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_then_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = counting(&calls);
        let galaxy = Galaxy::register(
            PluginOptions::new()
                .with_layout(LayoutSpec::Disabled)
                .with_cache(crate::CacheOptions::from_millis(1_000, 100)),
        )
        .unwrap();
        let options = || {
            raw()
                .with_path("/")
                .with_props(props(json!({"msg": "cached"})))
        };

        galaxy.reply(renderer.clone(), options()).await;
        galaxy.reply(renderer.clone(), options()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1_001)).await;
        let response = galaxy.reply(renderer, options()).await;
        assert_eq!(response.text(), "<p>cached</p>");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_never_mixes_same_type_components() {
        let galaxy = Galaxy::register(
            PluginOptions::new()
                .with_layout(LayoutSpec::Disabled)
                .with_cache(crate::CacheOptions::from_millis(60_000, 100)),
        )
        .unwrap();
        let page = |label: &'static str| {
            Renderer::new(move |_: Props, _: String| async move {
                Ok::<_, RenderError>(label.to_string())
            })
        };

        let english = galaxy
            .render(page("english"), raw().with_path("/"))
            .await
            .unwrap();
        let french = galaxy
            .render(page("french"), raw().with_path("/"))
            .await
            .unwrap();

        assert_eq!(english, "english");
        assert_eq!(french, "french");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_fragments_are_dropped() {
        let galaxy = Galaxy::register(
            PluginOptions::new()
                .with_layout(LayoutSpec::Disabled)
                .with_cache(crate::CacheOptions::from_millis(1_000, 100)),
        )
        .unwrap();
        let renderer = echo_path();

        for i in 0..200 {
            let path = format!("/items/{}", i);
            galaxy
                .render(renderer.clone(), raw().with_path(path))
                .await
                .unwrap();
        }
        let store = galaxy.cache().unwrap().store();
        assert_eq!(store.len().await, 200);

        tokio::time::advance(Duration::from_secs(3600)).await;
        galaxy
            .render(renderer, raw().with_path("/items/new"))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_render_times_out() {
        let galaxy = Galaxy::register(
            PluginOptions::new()
                .with_layout(LayoutSpec::Disabled)
                .with_cache(crate::CacheOptions::from_millis(1_000, 50)),
        )
        .unwrap();
        let slow = Renderer::new(|_: Props, _: String| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, RenderError>("late".to_string())
        });

        let err = galaxy.render(slow, ReplyOptions::new()).await.unwrap_err();
        assert!(matches!(err, GalaxyError::Timeout(d) if d == Duration::from_millis(50)));
    }
}
