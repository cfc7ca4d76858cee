// Layouts and document composition

use crate::component::Props;
use crate::error::{GalaxyError, Result};
use galaxy_core::{CONTAINER_ID, ViewEngine, hydration_script};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// Combines props and a rendered fragment into a document.
pub type Layout = Arc<dyn Fn(&Props, &str) -> String + Send + Sync>;

/// Which layout wraps a fragment.
#[derive(Clone, Default)]
pub enum LayoutSpec {
    /// The built-in HTML document, see [`default_layout`]
    #[default]
    Default,
    Custom(Layout),
    /// Emit the fragment unchanged
    Disabled,
}

impl LayoutSpec {
    pub fn custom<F>(layout: F) -> Self
    where
        F: Fn(&Props, &str) -> String + Send + Sync + 'static,
    {
        LayoutSpec::Custom(Arc::new(layout))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, LayoutSpec::Disabled)
    }

    pub fn apply(&self, props: &Props, fragment: String) -> Result<String> {
        match self {
            LayoutSpec::Default => default_layout(props, &fragment),
            LayoutSpec::Custom(layout) => Ok(layout(props, &fragment)),
            LayoutSpec::Disabled => Ok(fragment),
        }
    }
}

impl fmt::Debug for LayoutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutSpec::Default => f.write_str("Default"),
            LayoutSpec::Custom(_) => f.write_str("Custom(..)"),
            LayoutSpec::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Minimal HTML document with the fragment mounted in the Galaxy container
/// and `props` published for client hydration.
pub fn default_layout(props: &Props, fragment: &str) -> Result<String> {
    let script =
        hydration_script(props).map_err(|e| GalaxyError::Serialization(e.to_string()))?;

    Ok(format!(
        r#"
<html>
  <head>
    <meta charset="utf8">
  </head>
  <body>
    <div id="{}">{}</div>
    {}
  </body>
</html>"#,
        CONTAINER_ID, fragment, script
    ))
}

/// Produce the final document for a rendered fragment.
///
/// A view wins over the layout: when `view` is set the fragment and props go
/// to the view engine as `{content, props}` and `layout` is ignored.
pub async fn compose(
    props: &Props,
    fragment: String,
    layout: &LayoutSpec,
    view: Option<&str>,
    views: Option<&dyn ViewEngine>,
) -> Result<String> {
    let Some(view) = view else {
        return layout.apply(props, fragment);
    };

    let engine = views.ok_or_else(|| GalaxyError::ViewEngineMissing {
        view: view.to_string(),
    })?;

    galaxy_log::debug!("rendering view '{}'", view);
    let context = json!({ "content": fragment, "props": Value::Object(props.clone()) });
    engine
        .render_view(view, &context)
        .await
        .map_err(GalaxyError::View)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn props(value: Value) -> Props {
        value.as_object().cloned().unwrap()
    }

    struct EchoViews;

    #[async_trait]
    impl ViewEngine for EchoViews {
        async fn render_view(
            &self,
            name: &str,
            context: &Value,
        ) -> std::result::Result<String, galaxy_core::Error> {
            if name == "missing" {
                return Err(galaxy_core::Error::View("no such view".into()));
            }
            Ok(format!("[{}] {} {}", name, context["content"], context["props"]))
        }
    }

    #[test]
    fn test_default_layout_embeds_fragment_and_props() {
        let doc = default_layout(&props(json!({"msg": "hi"})), "<p>hi</p>").unwrap();

        assert!(doc.starts_with("\n<html>"));
        assert!(doc.contains(r#"<meta charset="utf8">"#));
        assert!(doc.contains(r#"<div id="__galaxy"><p>hi</p></div>"#));
        assert!(doc.contains(r#"<script>window.GALAXY = { __galaxy: ({"msg":"hi"}) };</script>"#));
        assert!(doc.ends_with("</html>"));
    }

    #[test]
    fn test_default_layout_escapes_state() {
        let doc = default_layout(&props(json!({"x": "</script><script>alert(1)"})), "").unwrap();
        assert_eq!(doc.matches("</script>").count(), 1);
    }

    #[test]
    fn test_disabled_layout_passes_fragment_through() {
        let doc = LayoutSpec::Disabled
            .apply(&Props::new(), "<p>raw</p>".into())
            .unwrap();
        assert_eq!(doc, "<p>raw</p>");
    }

    #[test]
    fn test_custom_layout() {
        let layout = LayoutSpec::custom(|props, fragment| {
            format!("<main data-n=\"{}\">{}</main>", props.len(), fragment)
        });
        let doc = layout
            .apply(&props(json!({"a": 1, "b": 2})), "x".into())
            .unwrap();
        assert_eq!(doc, "<main data-n=\"2\">x</main>");
    }

    #[tokio::test]
    async fn test_compose_prefers_view() {
        let layout = LayoutSpec::custom(|_, _| "layout".to_string());
        let doc = compose(
            &props(json!({"a": 1})),
            "frag".into(),
            &layout,
            Some("page"),
            Some(&EchoViews),
        )
        .await
        .unwrap();

        assert_eq!(doc, r#"[page] "frag" {"a":1}"#);
    }

    #[tokio::test]
    async fn test_compose_without_view_uses_layout() {
        let doc = compose(&Props::new(), "frag".into(), &LayoutSpec::Disabled, None, Some(&EchoViews))
            .await
            .unwrap();
        assert_eq!(doc, "frag");
    }

    #[tokio::test]
    async fn test_compose_view_without_engine() {
        let err = compose(&Props::new(), "frag".into(), &LayoutSpec::Default, Some("page"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GalaxyError::ViewEngineMissing { ref view } if view == "page"));
    }

    #[tokio::test]
    async fn test_compose_view_failure() {
        let err = compose(
            &Props::new(),
            "frag".into(),
            &LayoutSpec::Default,
            Some("missing"),
            Some(&EchoViews),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GalaxyError::View(_)));
    }
}
