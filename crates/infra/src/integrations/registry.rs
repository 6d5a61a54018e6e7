//! Destination pipelines built from configuration
//!
//! One HTTP client and one token store are shared by every destination, so
//! tokens for the same credential scope are fetched once regardless of which
//! pipeline asks.

use std::collections::BTreeMap;
use std::sync::Arc;

use adrelay_common::auth::{InMemoryTokenStore, TokenStore};
use adrelay_core::{ConversionPipeline, IdentifierLookup};
use adrelay_domain::{Config, GoogleAdsConfig, Result};
use tracing::info;

use super::{authorizer_for, google_ads, hubspot, snap};
use super::{Ga4Event, Ga4Sink, GoogleAdsAction, GoogleAdsSink, HubSpotSink, SnapSink};
use crate::http::HttpClient;
use crate::resolver::CachingIdentifierResolver;

/// Named conversion pipelines, one per configured destination action.
pub struct DestinationRegistry {
    pipelines: BTreeMap<&'static str, Arc<ConversionPipeline>>,
    tokens: Arc<dyn TokenStore>,
}

impl DestinationRegistry {
    /// Build every destination that has a configuration section.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = HttpClient::from_config(&config.http)?;
        let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
        let mut registry = Self { pipelines: BTreeMap::new(), tokens };

        if let Some(google) = &config.google_ads {
            registry.add_google_ads(&http, config, google);
        }

        if let Some(snap_config) = &config.snap {
            let authorizer =
                authorizer_for(&http, &snap_config.credentials, snap::TOKEN_URL, registry.tokens.clone());
            let sink = Arc::new(SnapSink::new(snap_config, authorizer));
            registry.insert(ConversionPipeline::new(sink));
        }

        if let Some(hubspot_config) = &config.hubspot {
            let authorizer = authorizer_for(
                &http,
                &hubspot_config.credentials,
                hubspot::TOKEN_URL,
                registry.tokens.clone(),
            );
            let sink = Arc::new(HubSpotSink::new(hubspot_config, authorizer));
            registry.insert(ConversionPipeline::new(sink));
        }

        if let Some(ga4_config) = &config.ga4 {
            for event in [Ga4Event::GenerateLead, Ga4Event::ViewItem] {
                let sink = Arc::new(Ga4Sink::new(ga4_config, event, http.clone()));
                registry.insert(ConversionPipeline::new(sink));
            }
        }

        info!(destinations = ?registry.names(), "destination registry ready");
        Ok(registry)
    }

    /// Call and click pipelines share one authorizer and one custom
    /// variable cache.
    fn add_google_ads(&mut self, http: &HttpClient, config: &Config, google: &GoogleAdsConfig) {
        let authorizer =
            authorizer_for(http, &google.credentials, google_ads::TOKEN_URL, self.tokens.clone());
        let mut resolver: Option<Arc<CachingIdentifierResolver>> = None;

        for action in
            [GoogleAdsAction::UploadCallConversions, GoogleAdsAction::UploadClickConversions]
        {
            let sink = Arc::new(GoogleAdsSink::new(google, action, authorizer.clone()));
            if resolver.is_none() {
                resolver = sink.lookup().map(|lookup| {
                    let lookup: Arc<dyn IdentifierLookup> = Arc::new(lookup);
                    Arc::new(CachingIdentifierResolver::from_config(lookup, &config.resolver))
                });
            }

            let pipeline = match &resolver {
                Some(resolver) => ConversionPipeline::new(sink).with_resolver(resolver.clone()),
                None => ConversionPipeline::new(sink),
            };
            self.insert(pipeline);
        }
    }

    fn insert(&mut self, pipeline: ConversionPipeline) {
        self.pipelines.insert(pipeline.sink_name(), Arc::new(pipeline));
    }

    /// Pipeline registered under a sink name such as
    /// `google_ads_click_conversions`.
    pub fn get(&self, name: &str) -> Option<Arc<ConversionPipeline>> {
        self.pipelines.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.pipelines.keys().copied().collect()
    }

    /// Token store shared by every OAuth destination.
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        self.tokens.clone()
    }
}
