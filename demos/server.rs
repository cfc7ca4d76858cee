//! A minimal host that routes requests to Galaxy handlers.
//!
//! Run with: cargo run --example server

use galaxy::prelude::*;
use galaxy::{ComponentRegistry, props_from_value};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

fn app() -> Renderer {
    Renderer::named("app", |props: Props, path: String| async move {
        let user = props.get("user").and_then(Value::as_str).unwrap_or("guest");
        Ok::<_, RenderError>(format!(
            "<nav>{}</nav><h1>Hello, {}</h1>",
            path, user
        ))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    galaxy::galaxy_log::init();

    let views = HandlebarsService::new(HandlebarsConfig::in_memory())?;
    views.register_template(
        "shell",
        "<!doctype html><html><body><div id=\"__galaxy\">{{{content}}}</div>{{hydrate props}}</body></html>",
    )?;

    let registry = ComponentRegistry::new().with_component("app", app());
    let galaxy = Galaxy::builder()
        .options(PluginOptions::new().with_cache(CacheOptions::from_millis(60_000, 500)))
        .loader(registry)
        .view_engine(views)
        .register()?;

    let mut routes: HashMap<&str, Arc<dyn RequestHandler>> = HashMap::new();
    routes.insert("/", Arc::new(galaxy.handler(HandlerOptions::new("app"))?));
    routes.insert(
        "/shell",
        Arc::new(galaxy.handler(HandlerOptions::new("app").with_view("shell"))?),
    );

    let requests = [
        HttpRequest::get("/"),
        HttpRequest::get("/shell").with_pre("props", json!({"user": "ada"})),
        HttpRequest::get("/"),
    ];

    for request in requests {
        let path = request.path.clone();
        let Some(handler) = routes.get(path.as_str()) else {
            println!("{} -> 404", path);
            continue;
        };
        let response = handler.handle(request).await?;
        println!("{} -> {}\n{}\n", path, response.status, response.text());
    }

    let fallback = galaxy
        .reply(
            app(),
            ReplyOptions::new()
                .with_path("/direct")
                .with_props(props_from_value(json!({"user": "reply"}))?),
        )
        .await;
    println!("/direct -> {}\n{}", fallback.status, fallback.text());

    Ok(())
}
