//! Catalog ingestion library.
//!
//! Pulls anime, manga, characters, people, producers, magazines, genres,
//! episodes and their relationships from the Jikan v4 API into the SQLite
//! catalog, with idempotent and partially fault-tolerant semantics.
//!
//! Layers, leaves first:
//! - [`api::FetchClient`]: rate-limited, retrying HTTP GET
//! - [`traversal`]: page and id-range crawl loops
//! - [`fetchers`]: one strategy per entity kind
//! - [`mappers`]: pure payload to row transforms

pub mod api;
pub mod error;
pub mod fetchers;
pub mod mappers;
pub mod progress;
pub mod result;
pub mod traversal;

pub use api::{FetchClient, RateLimiter};
pub use error::{FetcherError, FetcherErrorKind};
pub use fetchers::{FetchMode, FetcherContext, ItemFetcher, PageFetcher};
pub use progress::{ProgressReporter, TrackingProgress};
pub use result::{DatabaseOperationResult, OperationProgress, Outcome};
