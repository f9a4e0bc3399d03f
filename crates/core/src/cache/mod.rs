//! Client-side query cache and the optimistic mutation protocol over it.

pub mod optimistic;
pub mod query_cache;
pub mod transforms;

pub use optimistic::{CacheSnapshot, OptimisticMutationCoordinator};
pub use query_cache::{CacheEvent, CacheKey, FetchOutcome, QueryCache};
pub use transforms::{patch_by_id, prepend, remove_by_id, replace_by_id, Identified};
