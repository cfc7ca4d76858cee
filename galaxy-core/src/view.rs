//! The external view subsystem.
//!
//! A host that can render named templates exposes that through
//! [`ViewEngine`]. Galaxy only ever calls [`ViewEngine::render_view`] with a
//! context of the shape `{ "content": <fragment>, "props": <properties> }`.

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ViewEngine: Send + Sync {
    /// Render template `name` with `context` into a complete document.
    async fn render_view(&self, name: &str, context: &Value) -> Result<String, crate::Error>;
}
