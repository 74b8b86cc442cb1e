use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    api::{
        catalog::{Customer, CustomerId, Etrier, EtrierId, PartId},
        user, Ref,
    },
    reception::{Position, ReturnStatus, State},
};

pub use crate::reception::Id;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reception {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    #[serde(default)]
    pub reception_number: String,
    #[serde(default)]
    pub client: Option<Ref<Customer>>,
    #[serde(default)]
    pub etrier: Option<Ref<Etrier>>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub user: Option<Ref<UserRef>>,
    pub etat: Etat,
    #[serde(default)]
    pub is_returned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered: Option<Delivered>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_status: Option<ReturnStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<String>,
    #[serde(default)]
    pub extra: Extra,
    #[serde(default)]
    pub observation: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

/// Repair state as spelled on the wire.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Etat {
    #[serde(rename = "recus")]
    Recus,
    #[serde(rename = "en cours")]
    EnCours,
    #[serde(rename = "finit")]
    Finit,
    /// Older records mark a completed return in the state itself.
    #[serde(rename = "returner")]
    Returner,
}

impl From<State> for Etat {
    fn from(state: State) -> Self {
        match state {
            State::Received => Self::Recus,
            State::InProgress => Self::EnCours,
            State::Finished => Self::Finit,
        }
    }
}

/// `delivered` is either a boolean or the string `"yes"`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Delivered {
    Flag(bool),
    Text(String),
}

impl Delivered {
    pub fn is_set(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => {
                text.eq_ignore_ascii_case("yes")
                    || text.eq_ignore_ascii_case("true")
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserRef {
    #[serde(rename = "_id", alias = "id")]
    pub id: user::Id,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<SerialNumber>,
    #[serde(default)]
    pub pieces: Vec<PartId>,
    #[serde(default)]
    pub piece_counters: HashMap<PartId, i64>,
}

/// Serial numbers are normally plain strings, but some records wrap them in
/// an object carrying a field of the same name.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SerialNumber {
    Plain(String),
    Wrapped {
        #[serde(default, rename = "serialNumber")]
        serial_number: Option<String>,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewReception {
    pub client: CustomerId,
    pub etrier: EtrierId,
    pub user: user::Id,
    pub position: Position,
    pub observation: String,
    pub etat: Etat,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtatInput {
    pub etat: Etat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReturnRequestInput {
    pub reason: String,
}

/// Full replacement of the parts attached to a reception.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraInput {
    pub pieces: Vec<PartId>,
    pub piece_counters: BTreeMap<PartId, u32>,
}
