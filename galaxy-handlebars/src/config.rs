//! Configuration for the Handlebars view engine

use std::path::PathBuf;

/// Where views come from and how they are rendered.
#[derive(Debug, Clone)]
pub struct HandlebarsConfig {
    /// Directory scanned for view files. `None` keeps the engine in-memory,
    /// with views added through `register_template`.
    pub template_dir: Option<PathBuf>,

    /// View file extension (default: ".hbs")
    pub template_extension: String,

    /// Reload views from disk before every render
    pub dev_mode: bool,

    /// Fail on missing variables instead of rendering them empty
    pub strict_mode: bool,

    /// Extra directory loaded as partials
    pub partials_dir: Option<PathBuf>,

    /// HTML-escape `{{expr}}` output (default: true)
    pub escape_html: bool,
}

impl HandlebarsConfig {
    /// Load views from `template_dir`.
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: Some(template_dir.into()),
            ..Self::in_memory()
        }
    }

    /// Engine with no backing directory.
    pub fn in_memory() -> Self {
        Self {
            template_dir: None,
            template_extension: ".hbs".to_string(),
            dev_mode: false,
            strict_mode: false,
            partials_dir: None,
            escape_html: true,
        }
    }

    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.template_extension = ext.into();
        self
    }

    pub fn with_dev_mode(mut self, enable: bool) -> Self {
        self.dev_mode = enable;
        self
    }

    pub fn with_strict_mode(mut self, enable: bool) -> Self {
        self.strict_mode = enable;
        self
    }

    pub fn with_partials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.partials_dir = Some(dir.into());
        self
    }

    pub fn with_escape_html(mut self, enable: bool) -> Self {
        self.escape_html = enable;
        self
    }
}

impl Default for HandlebarsConfig {
    fn default() -> Self {
        Self::new("views")
    }
}
