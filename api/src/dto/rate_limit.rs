use std::net::IpAddr;

use lg_core::GuardStatus;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Selects the rate limiting state an operator request refers to
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitQuery {
    /// Caller address, e.g. `203.0.113.5` or `2001:db8::1`
    pub origin: Option<String>,
    /// Attempted account identifier
    pub identity: Option<String>,
}

impl RateLimitQuery {
    /// Parse into an origin address and a non-blank identity; at least one is required
    pub fn parse(&self) -> Result<(Option<IpAddr>, Option<&str>), ApiError> {
        let origin = match self.origin.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(raw.parse::<IpAddr>().map_err(|_| {
                ApiError::Validation(format!("origin '{}' is not a valid IP address", raw))
            })?),
        };
        let identity = self
            .identity
            .as_deref()
            .map(str::trim)
            .filter(|identity| !identity.is_empty());

        if origin.is_none() && identity.is_none() {
            return Err(ApiError::Validation(
                "at least one of origin or identity is required".to_string(),
            ));
        }

        Ok((origin, identity))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatusResponse {
    pub enabled: bool,
    #[serde(flatten)]
    pub status: GuardStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    /// Whether any state existed and was cleared
    pub reset: bool,
    pub account_key: Option<String>,
    pub origin_key: Option<String>,
}
