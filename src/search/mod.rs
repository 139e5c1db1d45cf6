//! Search layer facade.
//!
//! - **[`fuzzy`]**: Levenshtein distance and tolerance matching.
//! - **[`scoring`]**: Additive relevance score and its weights.
//! - **[`filters`]**: Structural category/equipment/muscle/difficulty filters.
//! - **[`cache`]**: TTL result cache keyed by canonical request signature.
//! - **[`query`]**: [`SearchClient`], the orchestrator tying store, cache and ranking together.
//! - **[`debounce`]**: Deferred, cancellable search scheduling.

pub mod cache;
pub mod debounce;
pub mod filters;
pub mod fuzzy;
pub mod query;
pub mod scoring;

pub use debounce::{CancelHandle, Debouncer, PendingSearch};
pub use query::{SearchClient, SearchError, SearchSettings};
