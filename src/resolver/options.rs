//! Resolver configuration and the partial options merged by `setup`

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::Settings;

/// Context passed to the diagnostic hook, e.g. `hearthstonejson_url`.
pub type DiagnosticContext = BTreeMap<String, String>;

/// Callable receiving non-fatal fetch failures.
pub type DiagnosticHook = Arc<dyn Fn(&str, &DiagnosticContext) + Send + Sync>;

/// Locale used until `setup` supplies another one
pub const DEFAULT_LOCALE: &str = "enUS";

/// Effective resolver configuration.
#[derive(Clone)]
pub struct ResolverConfig {
    pub source_template: Option<String>,
    pub locale: String,
    pub logger: Option<DiagnosticHook>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            source_template: None,
            locale: DEFAULT_LOCALE.to_string(),
            logger: None,
        }
    }
}

impl fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("source_template", &self.source_template)
            .field("locale", &self.locale)
            .field("logger", &self.logger.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl ResolverConfig {
    /// Shallow merge: every key present in `options` replaces ours.
    pub fn apply(&mut self, options: ResolverOptions) {
        if let Some(template) = options.source_template {
            self.source_template = Some(template);
        }
        if let Some(locale) = options.locale {
            self.locale = locale;
        }
        if let Some(logger) = options.logger {
            self.logger = Some(logger);
        }
    }
}

/// Partial configuration; `None` fields leave the current value untouched.
#[derive(Default, Clone)]
pub struct ResolverOptions {
    pub source_template: Option<String>,
    pub locale: Option<String>,
    pub logger: Option<DiagnosticHook>,
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_template(mut self, template: impl Into<String>) -> Self {
        self.source_template = Some(template.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn logger<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &DiagnosticContext) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(hook));
        self
    }
}

impl From<&Settings> for ResolverOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            source_template: settings.source.template.clone(),
            locale: Some(settings.source.locale.clone()),
            logger: None,
        }
    }
}
