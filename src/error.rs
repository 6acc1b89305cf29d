//! Error kinds for the resolution pipeline.
//!
//! Every variant is captured at record level by the batch pipeline and never
//! aborts the enclosing batch. None of them triggers a retry.

use thiserror::Error;

/// Errors from the address resolution step.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The geocoder returned an empty match list
    #[error("no match found for address")]
    NotFound,
    /// Transport, auth, quota or timeout failure
    #[error("geocoding service error: {0}")]
    Service(String),
}

/// Errors from the footprint lookup step.
#[derive(Debug, Clone, Error)]
pub enum LocateError {
    /// No building way within the search radius
    #[error("no building found near point")]
    NotFound,
    /// Transport or timeout failure against the footprint provider
    #[error("footprint service error: {0}")]
    Service(String),
    /// The provider response did not parse into the expected shape
    #[error("malformed footprint payload: {0}")]
    Payload(String),
}
