//! Handlebars registry wrapper

use crate::{Result, config::HandlebarsConfig, error::HandlebarsError, helpers};
use handlebars::Handlebars;
use parking_lot::RwLock;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct HandlebarsEngine {
    handlebars: Arc<RwLock<Handlebars<'static>>>,
    config: HandlebarsConfig,
}

impl HandlebarsEngine {
    pub fn new(config: HandlebarsConfig) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(config.strict_mode);
        if !config.escape_html {
            handlebars.register_escape_fn(handlebars::no_escape);
        }
        helpers::register_builtin_helpers(&mut handlebars);

        let engine = Self {
            handlebars: Arc::new(RwLock::new(handlebars)),
            config,
        };
        engine.load_templates()?;

        Ok(engine)
    }

    fn load_templates(&self) -> Result<()> {
        let Some(template_dir) = &self.config.template_dir else {
            return Ok(());
        };

        if !template_dir.exists() {
            return Err(HandlebarsError::ConfigError(format!(
                "View directory not found: {:?}",
                template_dir
            )));
        }

        self.load_dir(template_dir, template_dir)?;

        if let Some(partials_dir) = &self.config.partials_dir {
            if partials_dir.exists() {
                self.load_dir(partials_dir, partials_dir)?;
            }
        }

        Ok(())
    }

    /// Register every view under `dir`, named by its path relative to `root`
    /// without the extension (`layouts/main.hbs` -> `layouts/main`).
    fn load_dir(&self, root: &Path, dir: &Path) -> Result<()> {
        let extension = self.config.template_extension.trim_start_matches('.');

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                self.load_dir(root, &path)?;
                continue;
            }
            if path.extension().is_none_or(|ext| ext != extension) {
                continue;
            }

            let name = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .with_extension("")
                .to_string_lossy()
                .replace('\\', "/");
            let source = fs::read_to_string(&path)?;

            self.handlebars
                .write()
                .register_template_string(&name, source)?;
        }

        Ok(())
    }

    /// Render the view registered as `name`.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        if self.config.dev_mode {
            self.reload_templates()?;
        }

        let handlebars = self.handlebars.read();
        if !handlebars.has_template(name) {
            return Err(HandlebarsError::TemplateNotFound(name.to_string()));
        }
        Ok(handlebars.render(name, data)?)
    }

    /// Render an unregistered template string.
    pub fn render_template<T: Serialize>(&self, source: &str, data: &T) -> Result<String> {
        Ok(self.handlebars.read().render_template(source, data)?)
    }

    pub fn register_template(&self, name: &str, source: &str) -> Result<()> {
        Ok(self
            .handlebars
            .write()
            .register_template_string(name, source)?)
    }

    pub fn register_partial(&self, name: &str, source: &str) -> Result<()> {
        Ok(self.handlebars.write().register_partial(name, source)?)
    }

    pub fn register_helper<F>(&self, name: &str, helper: F)
    where
        F: handlebars::HelperDef + Send + Sync + 'static,
    {
        self.handlebars.write().register_helper(name, Box::new(helper));
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.read().has_template(name)
    }

    pub fn get_templates(&self) -> Vec<String> {
        self.handlebars.read().get_templates().keys().cloned().collect()
    }

    /// Drop every registered view and load the directory again.
    pub fn reload_templates(&self) -> Result<()> {
        self.handlebars.write().clear_templates();
        self.load_templates()
    }

    pub fn config(&self) -> &HandlebarsConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_views() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let layouts = temp_dir.path().join("layouts");
        fs::create_dir(&layouts).unwrap();

        fs::write(
            temp_dir.path().join("page.hbs"),
            "<main>{{{content}}}</main>",
        )
        .unwrap();
        fs::write(layouts.join("main.hbs"), "<body>{{{content}}}</body>").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        temp_dir
    }

    #[test]
    fn test_loads_nested_views() {
        let dir = create_views();
        let engine = HandlebarsEngine::new(HandlebarsConfig::new(dir.path())).unwrap();

        let mut names = engine.get_templates();
        names.sort();
        assert_eq!(names, vec!["layouts/main".to_string(), "page".to_string()]);
    }

    #[test]
    fn test_render_view() {
        let dir = create_views();
        let engine = HandlebarsEngine::new(HandlebarsConfig::new(dir.path())).unwrap();

        let html = engine
            .render("layouts/main", &json!({"content": "<p>hi</p>"}))
            .unwrap();
        assert_eq!(html, "<body><p>hi</p></body>");
    }

    #[test]
    fn test_missing_view() {
        let engine = HandlebarsEngine::new(HandlebarsConfig::in_memory()).unwrap();
        let err = engine.render("nope", &json!({})).unwrap_err();
        assert!(matches!(err, HandlebarsError::TemplateNotFound(ref n) if n == "nope"));
    }

    #[test]
    fn test_missing_directory() {
        let err = HandlebarsEngine::new(HandlebarsConfig::new("/definitely/not/here")).err();
        assert!(matches!(err, Some(HandlebarsError::ConfigError(_))));
    }

    #[test]
    fn test_escaping() {
        let engine = HandlebarsEngine::new(HandlebarsConfig::in_memory()).unwrap();
        engine.register_template("t", "{{content}}").unwrap();
        assert_eq!(
            engine.render("t", &json!({"content": "<b>"})).unwrap(),
            "&lt;b&gt;"
        );

        let raw = HandlebarsEngine::new(HandlebarsConfig::in_memory().with_escape_html(false))
            .unwrap();
        raw.register_template("t", "{{content}}").unwrap();
        assert_eq!(raw.render("t", &json!({"content": "<b>"})).unwrap(), "<b>");
    }

    #[test]
    fn test_dev_mode_reloads() {
        let dir = create_views();
        let config = HandlebarsConfig::new(dir.path()).with_dev_mode(true);
        let engine = HandlebarsEngine::new(config).unwrap();

        fs::write(dir.path().join("page.hbs"), "<section>{{{content}}}</section>").unwrap();

        let html = engine.render("page", &json!({"content": "x"})).unwrap();
        assert_eq!(html, "<section>x</section>");
    }

    #[test]
    fn test_strict_mode() {
        let config = HandlebarsConfig::in_memory().with_strict_mode(true);
        let engine = HandlebarsEngine::new(config).unwrap();

        engine.register_template("strict", "{{missing}}").unwrap();
        assert!(engine.render("strict", &json!({})).is_err());
    }
}
