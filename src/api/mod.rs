//! JSON shapes exchanged with the workshop REST API.

pub mod catalog;
pub mod reception;
pub mod user;

use serde::{Deserialize, Serialize};

pub use self::{reception::Reception, user::User};

/// List endpoints answer either with a bare array or with the array wrapped
/// in a `data` field.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum List<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> List<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// Referenced documents arrive either populated or as a bare id.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Populated(T),
    Id(String),
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}
