//! `varia_core` is the client-side decision engine of the Varia experimentation SDK. If you're
//! building an application, you probably want the higher-level client wrapper; this crate holds
//! the building blocks it is made of.
//!
//! # Overview
//!
//! [`Configuration`] is the heart of the engine. It is an immutable snapshot of the environment's
//! bucketing file (campaigns, variation groups with their targeting trees, variations with their
//! allocation weights) and is replaced wholesale on every refresh, never patched in place.
//!
//! [`ConfigurationStore`](configuration_store::ConfigurationStore) is a thread-safe multi-reader
//! manager for [`Configuration`]. Readers get a *snapshot* that is not affected by concurrent
//! refreshes, so one decision call sees one consistent configuration throughout.
//!
//! [`ConfigurationFetcher`](configuration_fetcher::ConfigurationFetcher) is the source of
//! configuration snapshots; [`HttpConfigurationFetcher`](configuration_fetcher::HttpConfigurationFetcher)
//! fetches the environment's `bucketing.json` from the CDN.
//!
//! [`PollerThread`](poller_thread::PollerThread) launches a background thread that periodically
//! refreshes the store through a fetcher, and exposes a stop handle.
//!
//! The [`targeting`] and [`allocation`] modules are pure functions: matching a visitor against a
//! targeting tree, and deterministically bucketing a visitor into a variation by hash. Together
//! they reproduce the server's assignment decision locally.
//!
//! The [`cache`] module defines the per-visitor assignment cache protocol that makes assignments
//! "sticky" across repeated calls, with pluggable storage backends.
//!
//! [`Engine`](engine::Engine) wires all of the above into the decision call:
//!
//! ```no_run
//! use varia_core::cache::InMemoryAssignmentCache;
//! use varia_core::engine::{Engine, EngineConfig};
//! use varia_core::Context;
//!
//! let (engine, _load_result) = Engine::new(
//!     "my_env_id",
//!     Some(Box::new(InMemoryAssignmentCache::new())),
//!     EngineConfig::new(),
//! );
//!
//! let context = [("plan".to_owned(), "premium".into())]
//!     .into_iter()
//!     .collect::<Context>();
//! let response = engine.decide("visitor_1", None, &context).unwrap();
//! for campaign in &response.campaigns {
//!     println!("{} -> {}", campaign.id, campaign.variation.id);
//! }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod allocation;
pub mod cache;
pub mod configuration_fetcher;
pub mod configuration_store;
pub mod engine;
pub mod poller_thread;
pub mod targeting;

mod configuration;
mod context;
mod decision;
mod error;

pub use configuration::{
    Campaign, Configuration, Modification, Targeting, TargetingGroup, TargetingOperator,
    TargetingTree, Variation, VariationGroup,
};
pub use context::{Context, ContextValue};
pub use decision::{DecidedCampaign, DecidedVariation, DecisionResponse};
pub use error::{Error, Result, TargetingError};
