//! The decision engine: campaign iteration, variation resolution, and assignment cache
//! coordination.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::allocation::allocate;
use crate::cache::{AssignmentCache, CachedAssignment, VisitorAssignments};
use crate::configuration_fetcher::{
    ConfigurationFetcher, HttpConfigurationFetcher, HttpFetcherConfig, DEFAULT_BASE_URL,
    DEFAULT_RETRIES, DEFAULT_TIMEOUT,
};
use crate::configuration_store::ConfigurationStore;
use crate::context::Context;
use crate::decision::{DecidedCampaign, DecidedVariation, DecisionResponse};
use crate::poller_thread::{PollerThread, PollerThreadConfig};
use crate::targeting::targeting_match;
use crate::{Error, Result};

/// Configuration for [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the bucketing file CDN.
    pub base_url: String,
    /// API key sent with configuration requests, if any.
    pub api_key: Option<String>,
    /// Per-request timeout for configuration fetches.
    pub timeout: Duration,
    /// Number of additional attempts after a failed configuration fetch.
    pub retries: u32,
    /// Interval between background configuration refreshes. `None` disables polling entirely;
    /// the configuration is then only the one loaded at construction (or by a lazy retry).
    pub polling_interval: Option<Duration>,
    /// Jitter applied to the polling interval.
    pub poll_jitter: Duration,
}

impl EngineConfig {
    /// Create a new `EngineConfig` using default configuration.
    pub fn new() -> EngineConfig {
        EngineConfig::default()
    }

    /// Update the bucketing CDN base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> EngineConfig {
        self.base_url = base_url.into();
        self
    }

    /// Update the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> EngineConfig {
        self.api_key = Some(api_key.into());
        self
    }

    /// Update the fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> EngineConfig {
        self.timeout = timeout;
        self
    }

    /// Update the fetch retry count.
    pub fn with_retries(mut self, retries: u32) -> EngineConfig {
        self.retries = retries;
        self
    }

    /// Update the polling interval. `None` disables background polling.
    pub fn with_polling_interval(mut self, interval: Option<Duration>) -> EngineConfig {
        self.polling_interval = interval;
        self
    }

    /// Update the polling jitter.
    pub fn with_poll_jitter(mut self, jitter: Duration) -> EngineConfig {
        self.poll_jitter = jitter;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            polling_interval: Some(PollerThreadConfig::DEFAULT_POLL_INTERVAL),
            poll_jitter: PollerThreadConfig::DEFAULT_POLL_JITTER,
        }
    }
}

/// The client-side decision engine.
///
/// An `Engine` holds the environment configuration (kept fresh by an optional background
/// poller), and decides per visitor which campaigns apply and which variation each campaign
/// resolves to: deterministically, without a network round-trip per decision.
pub struct Engine {
    store: Arc<ConfigurationStore>,
    fetcher: Arc<Mutex<Box<dyn ConfigurationFetcher>>>,
    cache: Option<Box<dyn AssignmentCache>>,
    poller: Option<PollerThread>,
}

impl Engine {
    /// Create an engine for the given environment, fetching configuration over HTTP.
    ///
    /// Construction performs one synchronous configuration load; its result is returned alongside
    /// the engine. On failure the engine is still usable; the next decision call lazily retries
    /// the load.
    pub fn new(
        env_id: impl Into<String>,
        cache: Option<Box<dyn AssignmentCache>>,
        config: EngineConfig,
    ) -> (Engine, Result<()>) {
        let fetcher = HttpConfigurationFetcher::new(
            env_id,
            HttpFetcherConfig {
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                timeout: config.timeout,
                retries: config.retries,
            },
        );

        Engine::with_fetcher(Box::new(fetcher), cache, config)
    }

    /// Create an engine with a custom configuration source.
    ///
    /// Only the polling fields of `config` apply; transport fields belong to the fetcher.
    pub fn with_fetcher(
        fetcher: Box<dyn ConfigurationFetcher>,
        cache: Option<Box<dyn AssignmentCache>>,
        config: EngineConfig,
    ) -> (Engine, Result<()>) {
        let mut engine = Engine {
            store: Arc::new(ConfigurationStore::new()),
            fetcher: Arc::new(Mutex::new(fetcher)),
            cache,
            poller: None,
        };

        let mut result = engine.load();

        if let Some(interval) = config.polling_interval {
            let poller_config = PollerThreadConfig::new()
                .with_interval(interval)
                .with_jitter(config.poll_jitter);
            match PollerThread::start(
                Arc::clone(&engine.fetcher),
                Arc::clone(&engine.store),
                poller_config,
            ) {
                Ok(poller) => engine.poller = Some(poller),
                Err(err) => result = result.and(Err(err.into())),
            }
        }

        (engine, result)
    }

    /// Fetch the environment configuration and swap it in as the current snapshot.
    pub fn load(&self) -> Result<()> {
        let result = self
            .fetcher
            .lock()
            .expect("thread holding fetcher lock should not panic")
            .fetch_configuration();

        match result {
            Ok(configuration) => {
                self.store.set_configuration(Arc::new(configuration));
                Ok(())
            }
            Err(err) => {
                log::warn!(target: "varia", "error when loading environment configuration: {err}");
                Err(err)
            }
        }
    }

    /// Decide which campaigns apply to the visitor, and which variation each resolves to.
    ///
    /// Campaigns and, within a campaign, variation groups are evaluated in declared order; the
    /// first matching group wins. A previously cached assignment is reused as long as the same
    /// variation group still matches and the variation still exists (sticky assignment);
    /// otherwise the variation is freshly allocated by visitor hash.
    ///
    /// The per-visitor cache read-modify-write is not atomic: two concurrent decisions for the
    /// same visitor id may race, and the last write wins over the whole assignment map.
    ///
    /// `anonymous_id` is carried for cross-device reconciliation by the surrounding client; the
    /// bucketing decision itself does not consume it.
    pub fn decide(
        &self,
        visitor_id: &str,
        anonymous_id: Option<&str>,
        context: &Context,
    ) -> Result<DecisionResponse> {
        let configuration = match self.store.get_configuration() {
            Some(configuration) => configuration,
            None => {
                log::info!(target: "varia", "configuration not loaded, loading it now");
                self.load()?;
                self.store
                    .get_configuration()
                    .ok_or(Error::ConfigurationMissing)?
            }
        };

        log::trace!(target: "varia", visitor_id, anonymous_id:serde; "deciding campaigns for visitor");

        let mut response = DecisionResponse {
            visitor_id: visitor_id.to_owned(),
            campaigns: Vec::new(),
        };

        if configuration.panic {
            log::info!(target: "varia", "environment is in panic mode, skipping all campaigns");
            return Ok(response);
        }

        let mut assignments = self.read_assignments(visitor_id);

        for campaign in &configuration.campaigns {
            let matched_group = campaign.variation_groups.iter().find(|group| {
                match targeting_match(&group.targeting, visitor_id, context) {
                    Ok(matched) => matched,
                    Err(err) => {
                        log::warn!(target: "varia",
                            campaign_id = campaign.id.as_str(),
                            variation_group_id = group.id.as_str();
                            "error occurred when checking targeting: {err}");
                        false
                    }
                }
            });

            let Some(group) = matched_group else {
                continue;
            };

            let cached = assignments.get(&campaign.id);

            // Sticky assignment: reuse the cached variation while the matched group is unchanged
            // and the variation still exists in it. Anything else re-rolls the hash.
            let sticky = cached
                .filter(|entry| entry.variation_group_id == group.id)
                .and_then(|entry| group.variations.iter().find(|v| v.id == entry.variation_id));

            let variation = match sticky {
                Some(variation) => variation,
                None => match allocate(visitor_id, &group.variations) {
                    Some(variation) => variation,
                    None => {
                        log::trace!(target: "varia",
                            visitor_id,
                            variation_group_id = group.id.as_str();
                            "visitor has no allocation for this variation group");
                        continue;
                    }
                },
            };

            let previously_activated = cached.map(|entry| entry.activated).unwrap_or(false);

            let mut flag_keys: Vec<String> =
                variation.modifications.value.keys().cloned().collect();
            flag_keys.sort();

            assignments.insert(
                campaign.id.clone(),
                CachedAssignment {
                    variation_group_id: group.id.clone(),
                    variation_id: variation.id.clone(),
                    activated: previously_activated,
                    flag_keys,
                },
            );

            response.campaigns.push(DecidedCampaign {
                id: campaign.id.clone(),
                custom_id: campaign.custom_id.clone(),
                variation_group_id: group.id.clone(),
                variation: DecidedVariation {
                    id: variation.id.clone(),
                    reference: variation.reference,
                    modifications: variation.modifications.clone(),
                },
            });
        }

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.set(visitor_id, &assignments) {
                log::warn!(target: "varia", visitor_id; "assignment cache saving failed: {err}");
            }
        }

        log::trace!(target: "varia",
            visitor_id,
            campaigns = response.campaigns.len();
            "decided campaigns for visitor");

        Ok(response)
    }

    fn read_assignments(&self, visitor_id: &str) -> VisitorAssignments {
        let Some(cache) = &self.cache else {
            return VisitorAssignments::new();
        };

        match cache.get(visitor_id) {
            Ok(Some(assignments)) => assignments,
            Ok(None) => VisitorAssignments::new(),
            Err(err) => {
                log::warn!(target: "varia", visitor_id; "failed to read assignment cache: {err}");
                VisitorAssignments::new()
            }
        }
    }

    /// Signal the background poller to stop, without waiting for it.
    ///
    /// No-op when polling is disabled.
    pub fn stop_polling(&self) {
        if let Some(poller) = &self.poller {
            poller.stop();
        }
    }

    /// Stop the background poller and block waiting for it to exit.
    pub fn shutdown(self) -> Result<()> {
        if let Some(poller) = self.poller {
            poller.shutdown()?;
        }
        Ok(())
    }
}
