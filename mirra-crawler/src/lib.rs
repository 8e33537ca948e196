pub mod crawler;
pub mod css;
pub mod error;
pub mod event;
pub mod extract;
pub mod fetcher;
pub mod filter;
pub mod paths;
pub mod reference;
pub mod registry;
pub mod result;
pub mod rewrite;

pub use crawler::{Mirror, Visit};
pub use error::MirrorError;
pub use event::{EventCallback, MirrorEvent};
pub use fetcher::{FetchedPage, Fetcher};
pub use filter::{UrlFilter, host_key};
pub use paths::PathMapper;
pub use registry::VisitedRegistry;
pub use result::{MirrorResult, MirrorStats, MirrorSummary, NodeStatus, SkipReason};
pub use rewrite::LinkRewriter;
pub use tokio_util::sync::CancellationToken;
