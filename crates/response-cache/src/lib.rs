//! Whole response caching for GraphQL operations.
//!
//! The crate is organised around the lifecycle of a single request:
//!
//! 1. While the operation executes, every field reports its cache hints to a [`HintCollector`].
//!    Hints come from `@cacheControl` directives (see [`CacheControlRegistry`]) or from resolvers
//!    calling [`FieldCacheHandle::set_cache_hint`].
//! 2. The hints are folded into the overall [`CachePolicy`] of the request, always keeping the most
//!    restrictive combination.
//! 3. The [`ResponseCachePlugin`] reads from the store before execution and writes the response back
//!    once it is known to be cacheable, keyed by the request identity and its session.
//! 4. The [`Gateway`] ties those steps together around an [`Executor`].

mod cache_control;
mod collector;
mod config;
mod error;
mod gateway;
mod hint;
mod key;
mod plugin;
mod policy;
mod request;
mod response;
mod schema;
mod store;

pub use cache_control::{cache_control_header_value, write_cache_control_header};
pub use collector::{FieldCacheHandle, HintCollector, PathSegment, ResponsePath};
pub use config::{
    CachePredicateHook, ExtraCacheKeyDataHook, GenerateCacheKeyHook, ResponseCacheConfig, ResponseCacheSettings,
    SessionIdHook,
};
pub use error::{Error, Hook};
pub use gateway::{Executor, Gateway};
pub use hint::{CacheHint, CacheScope};
pub use key::{default_cache_key, BaseCacheKeyData, CacheKeyData, ContextualCacheKeyData, SessionMode};
pub use plugin::ResponseCachePlugin;
pub use policy::{CachePolicy, ResolvedCachePolicy};
pub use request::{OperationContext, OperationType, Request};
pub use response::{GraphqlError, Response, ResponseBody, SingleResult};
pub use schema::{CacheControlRegistry, FieldDefinition};
pub use store::{CacheValue, ResponseCacheStore, DEFAULT_KEY_PREFIX};
