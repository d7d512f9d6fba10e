//! Client error taxonomy
//!
//! Gateway failures are never fatal: screens catch them at the call site,
//! log, surface a toast and stay usable.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors surfaced by repositories, the reconciler and screen controllers
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("invalid transition for order {order_id}: {detail}")]
    InvalidTransition { order_id: String, detail: String },

    #[error("order {0} is already paid")]
    AlreadyPaid(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("empty selection: {0}")]
    EmptySelection(&'static str),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("row decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn invalid_transition(order_id: impl Into<String>, detail: impl Into<String>) -> Self {
        ClientError::InvalidTransition {
            order_id: order_id.into(),
            detail: detail.into(),
        }
    }
}

impl From<GatewayError> for ClientError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable(msg) => ClientError::GatewayUnavailable(msg),
            GatewayError::Constraint(msg) => ClientError::ConstraintViolation(msg),
            GatewayError::Conflict(msg) => ClientError::ConstraintViolation(msg),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
