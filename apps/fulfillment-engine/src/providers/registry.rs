//! Provider registry and factory.
//!
//! A process-wide map from provider code to constructor. Lookup of an
//! unknown code fails with `InvalidProvider`; a constructor failure is
//! `ProviderInitFailed`. Codes are case-insensitive at the parse boundary.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use super::code::ProviderCode;
use super::{ProviderCreds, ProviderError, ShippingProvider};

/// Constructor for one provider.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderCreds) -> Result<Arc<dyn ShippingProvider>, ProviderError> + Send + Sync>;

/// Process-wide registry of provider constructors.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<ProviderCode, ProviderFactory>,
}

impl ProviderRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for a code.
    pub fn register<F>(&mut self, code: ProviderCode, factory: F)
    where
        F: Fn(&ProviderCreds) -> Result<Arc<dyn ShippingProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(code, Arc::new(factory));
    }

    /// Parse a raw code. Case-insensitive; unknown codes fail.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProvider` for codes outside the closed set.
    pub fn parse_code(raw: &str) -> Result<ProviderCode, ProviderError> {
        ProviderCode::from_str(raw).map_err(|code| ProviderError::InvalidProvider { code })
    }

    /// Build a provider from its code and decrypted credentials.
    ///
    /// # Errors
    ///
    /// `InvalidProvider` when no constructor is registered for the code;
    /// whatever the constructor raises otherwise.
    pub fn build(
        &self,
        code: ProviderCode,
        creds: &ProviderCreds,
    ) -> Result<Arc<dyn ShippingProvider>, ProviderError> {
        let factory = self
            .factories
            .get(&code)
            .ok_or_else(|| ProviderError::InvalidProvider {
                code: code.as_str().to_string(),
            })?;
        factory(creds)
    }

    /// Codes with a registered constructor.
    #[must_use]
    pub fn registered_codes(&self) -> Vec<ProviderCode> {
        let mut codes: Vec<ProviderCode> = self.factories.keys().copied().collect();
        codes.sort_by_key(ProviderCode::as_str);
        codes
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("codes", &self.registered_codes())
            .finish()
    }
}
