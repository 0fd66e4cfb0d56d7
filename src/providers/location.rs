use std::time::Duration;

use log::warn;
use thiserror::Error;

use crate::blockchain::UNKNOWN_LOCATION;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location lookup failed: {0}")]
    Unavailable(String),
    #[error("location lookup timed out after {0:?}")]
    TimedOut(Duration),
}

/// Supplies the location tag stamped on new blocks.
pub trait LocationProvider: Send + Sync {
    fn locate(&self) -> Result<String, LocationError>;
}

/// Always answers with the same tag.
#[derive(Debug, Clone)]
pub struct StaticLocation(String);

impl StaticLocation {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl LocationProvider for StaticLocation {
    fn locate(&self) -> Result<String, LocationError> {
        Ok(self.0.clone())
    }
}

/// Ask the provider for a tag, substituting [`UNKNOWN_LOCATION`] on failure
/// or an empty answer.
pub fn resolve_location(provider: &dyn LocationProvider) -> String {
    match provider.locate() {
        Ok(tag) if !tag.trim().is_empty() => tag,
        Ok(_) => UNKNOWN_LOCATION.to_string(),
        Err(e) => {
            warn!("LOCATION - {e}; using '{UNKNOWN_LOCATION}'");
            UNKNOWN_LOCATION.to_string()
        }
    }
}
