//! Components and how references to them are resolved.
//!
//! A component is an async function from `(props, path)` to a rendered
//! fragment. Call sites can hand one over directly, wrapped in a module with
//! a default export, or by name; [`resolve`] turns any of these into a
//! [`Renderer`]. Named components are looked up through a
//! [`ComponentLoader`], normally a [`ComponentRegistry`] filled at startup.

use crate::error::{GalaxyError, RenderError, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Properties a component renders from.
pub type Props = Map<String, Value>;

/// Rendered component output.
pub type Fragment = String;

type RenderFn =
    dyn Fn(Props, String) -> BoxFuture<'static, std::result::Result<Fragment, RenderError>>
        + Send
        + Sync;

/// A resolved, callable component.
///
/// Every renderer carries an identity string that feeds the render cache
/// fingerprint. Clones share identity. Each `Renderer::new` gets a fresh one,
/// even for functions of the same type, so two renderers only share cached
/// fragments when they are clones or were given the same [`Renderer::named`]
/// identity.
#[derive(Clone)]
pub struct Renderer {
    id: Arc<str>,
    render: Arc<RenderFn>,
}

impl Renderer {
    /// Wrap an async function under a fresh identity.
    ///
    /// ```
    /// use galaxy_ssr::{Props, RenderError, Renderer};
    ///
    /// let about = Renderer::new(|_props: Props, path: String| async move {
    ///     Ok::<_, RenderError>(format!("<h1>{}</h1>", path))
    /// });
    /// assert!(about.id().contains("closure"));
    /// ```
    pub fn new<F, Fut>(render: F) -> Self
    where
        F: Fn(Props, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Fragment, RenderError>> + Send + 'static,
    {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}#{}", type_name::<F>(), seq);

        Self::named(id, render)
    }

    /// Wrap an async function under an explicit identity.
    pub fn named<F, Fut>(id: impl Into<String>, render: F) -> Self
    where
        F: Fn(Props, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Fragment, RenderError>> + Send + 'static,
    {
        Self {
            id: Arc::from(id.into()),
            render: Arc::new(move |props, path| render(props, path).boxed()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Invoke the component.
    pub fn render(
        &self,
        props: Props,
        path: String,
    ) -> BoxFuture<'static, std::result::Result<Fragment, RenderError>> {
        (self.render)(props, path)
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer").field("id", &self.id).finish()
    }
}

/// A loaded module that may expose a default-export component.
#[derive(Clone, Debug, Default)]
pub struct ComponentModule {
    default: Option<Renderer>,
}

impl ComponentModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(renderer: Renderer) -> Self {
        Self {
            default: Some(renderer),
        }
    }

    pub fn default_export(&self) -> Option<&Renderer> {
        self.default.as_ref()
    }
}

/// What a [`ComponentLoader`] hands back for an identifier.
#[derive(Clone, Debug)]
pub enum LoadedComponent {
    Function(Renderer),
    Module(ComponentModule),
}

/// How a call site refers to a component.
#[derive(Clone, Debug)]
pub enum ComponentRef {
    /// The renderer itself
    Direct(Renderer),
    /// An identifier to look up through the loader
    Named(String),
    /// A module whose default export is the renderer
    WrappedDefault(ComponentModule),
}

impl From<Renderer> for ComponentRef {
    fn from(renderer: Renderer) -> Self {
        ComponentRef::Direct(renderer)
    }
}

impl From<ComponentModule> for ComponentRef {
    fn from(module: ComponentModule) -> Self {
        ComponentRef::WrappedDefault(module)
    }
}

impl From<&str> for ComponentRef {
    fn from(id: &str) -> Self {
        ComponentRef::Named(id.to_string())
    }
}

impl From<String> for ComponentRef {
    fn from(id: String) -> Self {
        ComponentRef::Named(id)
    }
}

/// Maps identifiers to components.
pub trait ComponentLoader: Send + Sync {
    fn load(&self, id: &str) -> Option<LoadedComponent>;
}

/// Components registered by identifier ahead of time.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, LoadedComponent>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component function under `id`.
    pub fn register(&mut self, id: impl Into<String>, renderer: Renderer) -> &mut Self {
        self.components
            .insert(id.into(), LoadedComponent::Function(renderer));
        self
    }

    /// Register a module under `id`; its default export is used on resolve.
    pub fn register_module(&mut self, id: impl Into<String>, module: ComponentModule) -> &mut Self {
        self.components
            .insert(id.into(), LoadedComponent::Module(module));
        self
    }

    pub fn with_component(mut self, id: impl Into<String>, renderer: Renderer) -> Self {
        self.register(id, renderer);
        self
    }

    pub fn with_module(mut self, id: impl Into<String>, module: ComponentModule) -> Self {
        self.register_module(id, module);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl ComponentLoader for ComponentRegistry {
    fn load(&self, id: &str) -> Option<LoadedComponent> {
        self.components.get(id).cloned()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.components.keys().collect();
        ids.sort();
        f.debug_struct("ComponentRegistry")
            .field("components", &ids)
            .finish()
    }
}

/// Turn a component reference into a callable renderer.
pub fn resolve(component: &ComponentRef, loader: Option<&dyn ComponentLoader>) -> Result<Renderer> {
    match component {
        ComponentRef::Direct(renderer) => Ok(renderer.clone()),
        ComponentRef::WrappedDefault(module) => default_export(module, "module"),
        ComponentRef::Named(id) => {
            let loader = loader.ok_or_else(|| {
                GalaxyError::Resolution(format!("no component loader to load '{}'", id))
            })?;

            match loader.load(id) {
                Some(LoadedComponent::Function(renderer)) => Ok(renderer),
                Some(LoadedComponent::Module(module)) => default_export(&module, id),
                None => Err(GalaxyError::Resolution(format!(
                    "component '{}' is not registered",
                    id
                ))),
            }
        }
    }
}

fn default_export(module: &ComponentModule, name: &str) -> Result<Renderer> {
    module.default_export().cloned().ok_or_else(|| {
        GalaxyError::Resolution(format!("{} has no callable default export", name))
    })
}
