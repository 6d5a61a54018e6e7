//! Conversion upload pipeline - core business logic

use std::collections::BTreeSet;
use std::sync::Arc;

use adrelay_domain::{AdRelayError, ConversionEvent, ResolvedIdentifiers, Result, UploadResult};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::ports::{ConversionSink, IdentifierResolver};
use crate::conversion::validation::validate_event;
use crate::mapping::Mapping;

/// Runs one upload call chain per inbound event (or batch):
/// settings check, validation, identifier resolution, payload build, upload.
pub struct ConversionPipeline {
    sink: Arc<dyn ConversionSink>,
    resolver: Option<Arc<dyn IdentifierResolver>>,
    mapping: Option<Mapping>,
}

impl ConversionPipeline {
    /// Create a pipeline for `sink` without custom-variable resolution.
    pub fn new(sink: Arc<dyn ConversionSink>) -> Self {
        Self { sink, resolver: None, mapping: None }
    }

    /// Resolve custom attributes through `resolver` before building.
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentifierResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Apply `mapping` to raw events passed to [`Self::process_raw`].
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    /// Upload a single event.
    ///
    /// # Errors
    /// Any kind in the taxonomy; configuration and validation failures are
    /// raised before network I/O.
    pub async fn process(&self, event: &ConversionEvent) -> Result<UploadResult> {
        self.process_batch(std::slice::from_ref(event)).await
    }

    /// Upload a batch of events in one platform call.
    ///
    /// # Errors
    /// As [`Self::process`]; additionally a validation error when the batch
    /// is empty or larger than the destination allows.
    pub async fn process_batch(&self, events: &[ConversionEvent]) -> Result<UploadResult> {
        let sink = self.sink.name();
        self.sink.check_settings()?;

        if events.is_empty() {
            return Err(AdRelayError::Validation("no events to upload".to_string()));
        }
        let max = self.sink.max_batch();
        if events.len() > max {
            return Err(AdRelayError::Validation(format!(
                "{sink} accepts at most {max} events per upload, got {}",
                events.len()
            )));
        }

        let accepted = self.sink.accepted_identity();
        for event in events {
            validate_event(event, accepted)?;
        }

        let resolved = self.resolve(events).await?;

        let records = events
            .iter()
            .map(|event| self.sink.build_record(event, &resolved))
            .collect::<Result<Vec<_>>>()?;
        let payload = self.sink.assemble(records)?;

        debug!(sink, records = payload.records, "dispatching upload");
        let result = self.sink.upload(payload).await;
        match &result {
            Ok(outcome) if outcome.partial_failure => warn!(
                sink,
                status = outcome.status,
                failed = ?outcome.failed_indices,
                "upload partially failed"
            ),
            Ok(outcome) => info!(sink, status = outcome.status, "upload succeeded"),
            Err(e) => warn!(sink, kind = e.label(), error = %e, "upload failed"),
        }
        result
    }

    /// Normalize a mapped event input object and upload it.
    ///
    /// # Errors
    /// Validation errors from normalization, then as [`Self::process`].
    pub async fn process_normalized(&self, input: &Value) -> Result<UploadResult> {
        let event = ConversionEvent::try_from_normalized(input)?;
        self.process(&event).await
    }

    /// Apply the configured mapping to a raw event, then upload it.
    ///
    /// # Errors
    /// A configuration error when no mapping is configured, then as
    /// [`Self::process_normalized`].
    pub async fn process_raw(&self, raw: &Value) -> Result<UploadResult> {
        let mapping = self.mapping.as_ref().ok_or_else(|| {
            AdRelayError::Configuration(format!("no field mapping configured for {}", self.sink.name()))
        })?;
        self.process_normalized(&mapping.evaluate(raw)).await
    }

    async fn resolve(&self, events: &[ConversionEvent]) -> Result<ResolvedIdentifiers> {
        let names: BTreeSet<String> =
            events.iter().flat_map(ConversionEvent::custom_attribute_names).collect();
        if names.is_empty() {
            return Ok(ResolvedIdentifiers::new());
        }

        match (&self.resolver, self.sink.lookup_credential()) {
            (Some(resolver), Some(credential)) => resolver.resolve(credential, &names).await,
            _ => {
                debug!(sink = self.sink.name(), "destination does not resolve custom variables");
                Ok(ResolvedIdentifiers::new())
            }
        }
    }
}
