// Core traits implemented by Galaxy for its host

use async_trait::async_trait;

/// Something a host route can dispatch a request to.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle an HTTP request and return a response
    async fn handle(
        &self,
        request: crate::HttpRequest,
    ) -> Result<crate::HttpResponse, crate::Error>;
}
