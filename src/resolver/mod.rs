//! Card catalog metadata resolver
//!
//! Resolves a build number to a parsed catalog by trying, in order:
//! 1. the persistent cache (`hsjson-build-<n>`)
//! 2. the build-specific remote source
//! 3. the `latest` remote source
//!
//! Build-specific results are written back to the cache; `latest` results
//! never are. Cumulative flags describing every attempt are kept in
//! [`ResolverTelemetry`].

pub mod options;
pub mod telemetry;

pub use options::{
    DEFAULT_LOCALE, DiagnosticContext, DiagnosticHook, ResolverConfig, ResolverOptions,
};
pub use telemetry::ResolverTelemetry;

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::cache::{FileCache, MemoryCache, NoopCache, PersistentCache};
use crate::catalog::{BuildNumber, BuildRequest, Catalog, LATEST_TOKEN};
use crate::config::{CacheBackend, Settings};
use crate::error::{ResolverError, ResolverResult, display_status};
use crate::transport::{FetchFailure, FetchOutcome, HttpTransport, Transport, expand_template};

/// Key under which the failing URL is passed to the diagnostic hook
pub const SOURCE_URL_CONTEXT_KEY: &str = "hearthstonejson_url";

/// Which path satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Cache,
    Build,
    Latest,
}

/// Outcome of a single `resolve` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Delivered {
        catalog: Catalog,
        source: ResolutionSource,
    },
    /// The transport was cancelled; nothing was delivered or recorded.
    Ignored,
}

impl Resolution {
    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            Self::Delivered { catalog, .. } => Some(catalog),
            Self::Ignored => None,
        }
    }

    pub fn source(&self) -> Option<ResolutionSource> {
        match self {
            Self::Delivered { source, .. } => Some(*source),
            Self::Ignored => None,
        }
    }
}

pub struct MetadataResolver {
    config: ResolverConfig,
    cache: Arc<dyn PersistentCache>,
    transport: Arc<dyn Transport>,
    telemetry: RwLock<ResolverTelemetry>,
}

impl MetadataResolver {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn PersistentCache>) -> Self {
        Self {
            config: ResolverConfig::default(),
            cache,
            transport,
            telemetry: RwLock::new(ResolverTelemetry::default()),
        }
    }

    /// Build a resolver with an HTTP transport and the configured cache
    /// backend. Cancelling `cancel` aborts its requests.
    pub fn from_settings(settings: &Settings, cancel: CancellationToken) -> ResolverResult<Self> {
        let transport = HttpTransport::from_config(&settings.http)?.with_cancellation(cancel);
        let mut resolver = Self::new(Arc::new(transport), cache_from_settings(settings));
        resolver.setup(ResolverOptions::from(settings));
        Ok(resolver)
    }

    /// Start from an existing trace instead of an empty one.
    pub fn with_telemetry(self, telemetry: ResolverTelemetry) -> Self {
        *self.telemetry.write() = telemetry;
        self
    }

    /// Merge options into the configuration; keys left `None` are kept.
    pub fn setup(&mut self, options: ResolverOptions) -> &mut Self {
        self.config.apply(options);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Snapshot of the cumulative flags.
    pub fn telemetry(&self) -> ResolverTelemetry {
        *self.telemetry.read()
    }

    pub fn cache(&self) -> &Arc<dyn PersistentCache> {
        &self.cache
    }

    /// Resolve a build number (or `latest`) to a parsed catalog.
    ///
    /// Delivers at most once. Build-specific failures fall back to `latest`;
    /// only a failing `latest` fetch, a missing source template or an
    /// unparseable body surface as errors.
    pub async fn resolve(&self, build: impl Into<BuildRequest>) -> ResolverResult<Resolution> {
        let build = match build.into() {
            BuildRequest::Build(build) => build,
            BuildRequest::Latest => return self.fetch_latest().await,
        };

        self.mark(|t| t.has_build = true);

        let cached = if self.cache.is_available() {
            self.read_cached(build)
        } else {
            None
        };
        if let Some(catalog) = cached {
            debug!("Serving build {build} from cache");
            self.mark(|t| t.cached = true);
            return Ok(Resolution::Delivered {
                catalog,
                source: ResolutionSource::Cache,
            });
        }

        self.fetch_build(build).await
    }

    /// Valid cached catalog for `build`, evicting the entry if it is corrupt.
    fn read_cached(&self, build: BuildNumber) -> Option<Catalog> {
        let key = build.cache_key();
        let raw = match self.cache.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read cached card data for build {build}: {e}");
                return None;
            }
        };

        match Catalog::parse(&raw) {
            Ok(catalog) if catalog.is_valid() => return Some(catalog),
            Ok(_) => warn!("Removing invalid card data in cache entry {key}"),
            Err(e) => warn!("Removing unparseable card data in cache entry {key}: {e}"),
        }

        if let Err(e) = self.cache.remove(&key) {
            warn!("Could not remove cache entry {key}: {e}");
        }
        None
    }

    async fn fetch_build(&self, build: BuildNumber) -> ResolverResult<Resolution> {
        let url = self.source_url(&build.to_string())?;

        match self.transport.fetch(&url).await {
            FetchOutcome::Completed(raw) => {
                let catalog = self.deliver(&url, &raw)?;
                if self.cache.is_available() {
                    let key = build.cache_key();
                    if let Err(e) = self.cache.set(&key, &raw) {
                        warn!("Could not store card data under {key}: {e}");
                    }
                }
                Ok(Resolution::Delivered {
                    catalog,
                    source: ResolutionSource::Build,
                })
            }
            FetchOutcome::Failed(failure) => {
                self.mark(|t| t.failed_any = true);
                self.report_build_failure(build, &url, &failure);
                self.fetch_latest().await
            }
            FetchOutcome::Cancelled => {
                debug!("Fetch of build {build} was cancelled");
                Ok(Resolution::Ignored)
            }
        }
    }

    async fn fetch_latest(&self) -> ResolverResult<Resolution> {
        let url = self.source_url(LATEST_TOKEN)?;

        match self.transport.fetch(&url).await {
            FetchOutcome::Completed(raw) => {
                self.mark(|t| t.fetched_latest = true);
                let catalog = self.deliver(&url, &raw)?;
                Ok(Resolution::Delivered {
                    catalog,
                    source: ResolutionSource::Latest,
                })
            }
            FetchOutcome::Failed(failure) => {
                self.mark(|t| {
                    t.failed_any = true;
                    t.failed_totally = true;
                });
                error!(
                    "Error fetching latest build from {url}: {} ({})",
                    display_status(&failure.status),
                    failure.reason
                );
                Err(ResolverError::LatestUnavailable {
                    url,
                    status: failure.status,
                })
            }
            FetchOutcome::Cancelled => {
                debug!("Fetch of latest build was cancelled");
                Ok(Resolution::Ignored)
            }
        }
    }

    /// Common success path for every remote body.
    fn deliver(&self, url: &str, raw: &str) -> ResolverResult<Catalog> {
        self.mark(|t| t.fetched_any = true);
        Catalog::parse(raw).map_err(|e| ResolverError::MalformedCatalog {
            source_url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn source_url(&self, token: &str) -> ResolverResult<String> {
        let template = self
            .config
            .source_template
            .as_deref()
            .ok_or(ResolverError::MissingSourceTemplate)?;
        Ok(expand_template(template, token, &self.config.locale))
    }

    fn report_build_failure(&self, build: BuildNumber, url: &str, failure: &FetchFailure) {
        let status = display_status(&failure.status);
        warn!(
            "Error fetching build {build} from {url}: {status} ({}); falling back to latest",
            failure.reason
        );

        if let Some(logger) = &self.config.logger {
            let message =
                format!("Card metadata: Error fetching build {build}\n\"{url}\" returned status {status}");
            let mut context = DiagnosticContext::new();
            context.insert(SOURCE_URL_CONTEXT_KEY.to_string(), url.to_string());
            logger(&message, &context);
        }
    }

    fn mark(&self, update: impl FnOnce(&mut ResolverTelemetry)) {
        let mut telemetry = self.telemetry.write();
        update(&mut telemetry);
    }
}

/// Persistent cache selected by `cache.backend`.
pub fn cache_from_settings(settings: &Settings) -> Arc<dyn PersistentCache> {
    match settings.cache.backend {
        CacheBackend::File => Arc::new(FileCache::new(settings.cache_dir())),
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Disabled => Arc::new(NoopCache),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Answers every URL with the same outcome and counts calls.
    struct FixedTransport {
        outcome: FetchOutcome,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn fetch(&self, _url: &str) -> FetchOutcome {
            *self.calls.lock() += 1;
            self.outcome.clone()
        }
    }

    fn resolver_with(outcome: FetchOutcome) -> (MetadataResolver, Arc<FixedTransport>) {
        let transport = Arc::new(FixedTransport {
            outcome,
            calls: Mutex::new(0),
        });
        let resolver = MetadataResolver::new(transport.clone(), Arc::new(MemoryCache::new()));
        (resolver, transport)
    }

    #[tokio::test]
    async fn missing_template_is_reported_on_first_fetch() {
        let (resolver, transport) = resolver_with(FetchOutcome::Completed("[1]".to_string()));

        let err = resolver.resolve(42u64).await.unwrap_err();
        assert!(matches!(err, ResolverError::MissingSourceTemplate));
        assert_eq!(*transport.calls.lock(), 0);
        assert!(resolver.telemetry().has_build);
    }

    #[tokio::test]
    async fn malformed_body_is_not_cached() {
        let (mut resolver, _) = resolver_with(FetchOutcome::Completed("<html>".to_string()));
        resolver.setup(ResolverOptions::new().source_template("/%(build)s/%(locale)s"));

        let err = resolver.resolve(7u64).await.unwrap_err();
        assert_eq!(err.status_code(), "MALFORMED_CATALOG");
        assert_eq!(resolver.cache().get("hsjson-build-7").unwrap(), None);
        assert!(resolver.telemetry().fetched_any);
    }

    #[tokio::test]
    async fn seeded_telemetry_is_kept() {
        let (resolver, _) = resolver_with(FetchOutcome::Cancelled);
        let resolver = resolver.with_telemetry(ResolverTelemetry {
            failed_any: true,
            ..Default::default()
        });
        assert!(resolver.telemetry().failed_any);
        assert!(!resolver.telemetry().cached);
    }

    #[tokio::test]
    async fn resolver_from_settings_honours_cancellation() {
        let mut settings = Settings::default();
        settings.cache.backend = CacheBackend::Memory;
        settings.source.locale = "frFR".to_string();
        let cancel = CancellationToken::new();

        let resolver = MetadataResolver::from_settings(&settings, cancel.clone()).unwrap();
        assert_eq!(resolver.config().locale, "frFR");
        assert_eq!(
            resolver.config().source_template.as_deref(),
            settings.source.template.as_deref()
        );

        cancel.cancel();
        assert_eq!(resolver.resolve(42u64).await.unwrap(), Resolution::Ignored);
        assert!(!resolver.telemetry().failed_any);
    }

    #[test]
    fn cache_backend_selection() {
        let mut settings = Settings::default();
        settings.cache.backend = CacheBackend::Disabled;
        assert!(!cache_from_settings(&settings).is_available());

        settings.cache.backend = CacheBackend::Memory;
        assert!(cache_from_settings(&settings).is_available());
    }
}
