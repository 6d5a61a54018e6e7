//! Conversion pipeline port interfaces

use std::collections::BTreeSet;

use adrelay_common::auth::Credential;
use adrelay_domain::{
    ConversionEvent, CustomVariable, IdentityField, ResolvedIdentifiers, Result, UploadResult,
};
use async_trait::async_trait;
use serde_json::Value;

/// Request body ready for upload, with the number of records it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub body: Value,
    pub records: usize,
}

/// Strategy that queries a platform for existing custom variables.
///
/// Implementations decide how to list (search stream, paginated listing);
/// they return only the variables that exist among `names`.
#[async_trait]
pub trait IdentifierLookup: Send + Sync {
    async fn lookup(&self, credential: &Credential, names: &[String]) -> Result<Vec<CustomVariable>>;
}

/// Maps custom attribute names to platform resource identifiers.
#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    /// Resolve every name in `names` for the credential's scope.
    ///
    /// # Errors
    /// Returns `AdRelayError::UnresolvedIdentifier` listing names the
    /// platform does not know.
    async fn resolve(
        &self,
        credential: &Credential,
        names: &BTreeSet<String>,
    ) -> Result<ResolvedIdentifiers>;
}

/// A destination that accepts conversion uploads.
#[async_trait]
pub trait ConversionSink: Send + Sync {
    /// Short destination name for logs.
    fn name(&self) -> &'static str;

    /// Check destination settings (account ids, pixel ids) before any other
    /// work.
    fn check_settings(&self) -> Result<()>;

    /// Identity fields the platform can attribute a conversion with.
    fn accepted_identity(&self) -> &'static [IdentityField];

    /// Credential used for identifier lookups, if the destination resolves
    /// custom variables.
    fn lookup_credential(&self) -> Option<&Credential> {
        None
    }

    /// Largest batch a single upload may carry.
    fn max_batch(&self) -> usize {
        1
    }

    /// Build one platform record from a validated event.
    fn build_record(&self, event: &ConversionEvent, resolved: &ResolvedIdentifiers)
        -> Result<Value>;

    /// Wrap built records in the platform request envelope.
    fn assemble(&self, records: Vec<Value>) -> Result<Payload>;

    /// Build a single-record payload. Pure: no I/O.
    fn build(&self, event: &ConversionEvent, resolved: &ResolvedIdentifiers) -> Result<Payload> {
        let record = self.build_record(event, resolved)?;
        self.assemble(vec![record])
    }

    /// Send the payload and classify the platform response.
    async fn upload(&self, payload: Payload) -> Result<UploadResult>;
}
