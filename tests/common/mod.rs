//! Shared test doubles for resolver integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cardmeta::{
    FetchFailure, FetchOutcome, MemoryCache, MetadataResolver, PersistentCache, ResolverOptions,
    ResolverResult, Transport,
};

pub const TEMPLATE: &str = "https://cards.test/v1/%(build)s/%(locale)s/cards.json";

pub fn url_for(token: &str) -> String {
    format!("https://cards.test/v1/{token}/enUS/cards.json")
}

/// Transport answering from a fixed URL table; unknown URLs get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, FetchOutcome>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: impl Into<String>, outcome: FetchOutcome) -> Self {
        self.responses.lock().insert(url.into(), outcome);
        self
    }

    pub fn body(self, token: &str, body: &str) -> Self {
        self.respond(url_for(token), FetchOutcome::Completed(body.to_string()))
    }

    pub fn status(self, token: &str, code: u16) -> Self {
        self.respond(url_for(token), FetchOutcome::Failed(FetchFailure::status(code)))
    }

    pub fn cancelled(self, token: &str) -> Self {
        self.respond(url_for(token), FetchOutcome::Cancelled)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.requests.lock().push(url.to_string());
        self.responses
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Failed(FetchFailure::status(404)))
    }
}

/// MemoryCache wrapper counting every call.
#[derive(Default)]
pub struct CountingCache {
    pub inner: MemoryCache,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub removes: AtomicUsize,
}

impl CountingCache {
    pub fn with_entry(key: &str, value: &str) -> Self {
        Self {
            inner: MemoryCache::with_entries([(key, value)]),
            ..Default::default()
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

impl PersistentCache for CountingCache {
    fn get(&self, key: &str) -> ResolverResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> ResolverResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> ResolverResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }

    fn keys(&self) -> ResolverResult<Vec<String>> {
        self.inner.keys()
    }
}

/// Resolver wired to the given doubles with [`TEMPLATE`] configured.
pub fn resolver(transport: Arc<ScriptedTransport>, cache: Arc<CountingCache>) -> MetadataResolver {
    let mut resolver = MetadataResolver::new(transport, cache);
    resolver.setup(ResolverOptions::new().source_template(TEMPLATE));
    resolver
}
