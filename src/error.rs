use std::{error::Error as StdError, io};

use derive_more::{Display, From};

use crate::reception;

#[derive(Debug, Display, From)]
pub enum Error {
    /// No response reached the client (connection refused, timeout, TLS).
    #[display("network error: {_0}")]
    Network(reqwest::Error),

    #[display("session missing or expired, log in again")]
    Unauthorized,

    #[display("forbidden: {_0}")]
    Forbidden(String),

    #[display("invalid transition: {_0}")]
    InvalidTransition(String),

    #[display("{_0}")]
    Validation(String),

    #[display("not found: {_0}")]
    NotFound(String),

    /// The admin return was approved but completing it failed. The record
    /// is left in the approved state and only the completion needs a retry.
    #[display(
        "return of reception {id} was approved but not completed ({source}), \
         retry completing it"
    )]
    ReturnNotCompleted {
        id: reception::Id,
        source: Box<Error>,
    },

    #[display("server answered {status}: {message}")]
    Server { status: u16, message: String },

    #[display("unexpected response payload: {_0}")]
    Decode(String),

    #[display("credential store: {_0}")]
    #[from]
    Storage(io::Error),

    #[display("credential store payload: {_0}")]
    #[from]
    Serialization(serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_transition(
        id: &reception::Id,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition(format!("reception {id}: {}", reason.into()))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e)
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            Self::ReturnNotCompleted { source, .. } => Some(source.as_ref()),
            Self::Storage(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Unauthorized
            | Self::Forbidden(_)
            | Self::InvalidTransition(_)
            | Self::Validation(_)
            | Self::NotFound(_)
            | Self::Server { .. }
            | Self::Decode(_) => None,
        }
    }
}
