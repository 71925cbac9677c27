/// The main library module for cardmeta
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod resolver;
pub mod transport;

// Explicit exports for better API clarity
pub use cache::{FileCache, MemoryCache, NoopCache, PersistentCache};
pub use catalog::{BuildNumber, BuildRequest, Catalog};
pub use config::Settings;
pub use error::{ResolverError, ResolverResult};
pub use resolver::{
    DiagnosticContext, MetadataResolver, Resolution, ResolutionSource, ResolverOptions,
    ResolverTelemetry,
};
pub use transport::{FetchFailure, FetchOutcome, HttpTransport, Transport};
