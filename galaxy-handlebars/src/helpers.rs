//! Helpers for Galaxy layouts.
//!
//! Helper output bypasses Handlebars escaping, so every helper here writes
//! either script-safe JSON or markup it built itself.

use galaxy_core::{hydration_script, serialize_state};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, JsonRender, Output, RenderContext,
    RenderErrorReason,
};

pub fn register_builtin_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("hydrate", Box::new(hydrate_helper));
    handlebars.register_helper("json", Box::new(json_helper));
    handlebars.register_helper("default", Box::new(default_helper));
}

/// Client hydration script: `{{hydrate props}}`
fn hydrate_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let props = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("hydrate", 0))?;

    let script = hydration_script(props.value())
        .map_err(|e| RenderErrorReason::Other(e.to_string()))?;
    out.write(&script)?;
    Ok(())
}

/// Script-safe JSON: `<script>var x = {{json data}};</script>`
fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("json", 0))?;

    let json =
        serialize_state(param.value()).map_err(|e| RenderErrorReason::Other(e.to_string()))?;
    out.write(&json)?;
    Ok(())
}

/// Fallback for empty values: `{{default title "Galaxy"}}`
fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("default", 0))?;
    let fallback = h
        .param(1)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("default", 1))?;

    let chosen = match value.value() {
        serde_json::Value::Null => fallback.value(),
        serde_json::Value::String(s) if s.is_empty() => fallback.value(),
        other => other,
    };

    out.write(&handlebars::html_escape(&chosen.render()))?;
    Ok(())
}
