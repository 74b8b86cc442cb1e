//! Receptions: calipers taken in for repair, and their lifecycle.
//!
//! A [`Reception`] moves through [`State::Received`], [`State::InProgress`]
//! and [`State::Finished`]. Two flags are layered on top of the state:
//! `delivered` once the item is handed back, and `is_returned` once a
//! return has been completed. A returned item is displayed and grouped as
//! its own pseudo-state whatever its underlying state is, see
//! [`Reception::status`].

pub mod parts;
pub mod returns;
pub mod serial;
pub mod workflow;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::api::{
    self,
    catalog::{Customer, CustomerId, Etrier, EtrierId},
    reception::{Etat, SerialNumber},
    user, Ref,
};

pub use self::{
    parts::PartsLedger,
    returns::ReturnStatus,
    workflow::{ReceptionStore, Workflow},
};

#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize,
)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum State {
    #[display("received")]
    Received,
    #[display("in progress")]
    InProgress,
    #[display("finished")]
    Finished,
}

/// What operators see: the state, unless the item came back.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Status {
    #[display("received")]
    Received,
    #[display("in progress")]
    InProgress,
    #[display("finished")]
    Finished,
    #[display("returned")]
    Returned,
}

/// Wheel position of the caliper.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize,
)]
pub enum Position {
    #[default]
    #[serde(rename = "avant gauche")]
    #[display("front left")]
    FrontLeft,
    #[serde(rename = "avant droit")]
    #[display("front right")]
    FrontRight,
    #[serde(rename = "arrière gauche")]
    #[display("rear left")]
    RearLeft,
    #[serde(rename = "arrière droit")]
    #[display("rear right")]
    RearRight,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Serial {
    Plain(String),
    /// Read from the legacy object-wrapped shape.
    Wrapped(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reception {
    pub id: Id,
    pub reception_number: String,
    pub client: Option<Customer>,
    pub etrier: Option<Etrier>,
    pub position: Position,
    pub assigned_user: Option<user::Id>,
    pub state: State,
    pub is_returned: bool,
    pub delivered: bool,
    pub return_status: ReturnStatus,
    pub return_reason: Option<String>,
    pub serial: Option<Serial>,
    pub observation: String,
    pub parts: PartsLedger,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

impl Reception {
    pub fn status(&self) -> Status {
        if self.is_returned {
            return Status::Returned;
        }
        match self.state {
            State::Received => Status::Received,
            State::InProgress => Status::InProgress,
            State::Finished => Status::Finished,
        }
    }

    /// Finished or came back: the items the delivery desk and the recap
    /// care about.
    pub fn is_completed(&self) -> bool {
        self.state == State::Finished || self.is_returned
    }

    /// Serial number whatever shape it was stored in.
    pub fn serial_number(&self) -> Option<&str> {
        match self.serial.as_ref()? {
            Serial::Plain(serial) | Serial::Wrapped(serial) => Some(serial),
        }
    }

    /// Serial number only when stored as a plain string.
    pub fn plain_serial_number(&self) -> Option<&str> {
        match self.serial.as_ref()? {
            Serial::Plain(serial) => Some(serial),
            Serial::Wrapped(_) => None,
        }
    }

    pub fn client_name(&self) -> &str {
        self.client.as_ref().map_or("", |c| c.name.as_str())
    }

    pub fn car_model(&self) -> &str {
        self.etrier.as_ref().map_or("", |e| e.car_model.as_str())
    }

    /// Time of the last transition, falling back to the intake time.
    pub fn last_transition_at(&self) -> OffsetDateTime {
        self.updated_at.unwrap_or(self.created_at)
    }
}

impl From<api::Reception> for Reception {
    fn from(wire: api::Reception) -> Self {
        let (state, legacy_returned) = match wire.etat {
            Etat::Recus => (State::Received, false),
            Etat::EnCours => (State::InProgress, false),
            Etat::Finit => (State::Finished, false),
            Etat::Returner => (State::Finished, true),
        };
        let is_returned = wire.is_returned || legacy_returned;
        let return_status = match wire.return_status {
            Some(status) => status,
            None if is_returned => ReturnStatus::Completed,
            None => ReturnStatus::None,
        };
        let serial = wire.extra.serial_number.and_then(|s| match s {
            SerialNumber::Plain(s) => Some(Serial::Plain(s)),
            SerialNumber::Wrapped { serial_number } => {
                serial_number.map(Serial::Wrapped)
            }
        });

        Self {
            id: wire.id,
            reception_number: wire.reception_number,
            client: wire.client.map(|c| match c {
                Ref::Populated(customer) => customer,
                Ref::Id(id) => Customer {
                    id: CustomerId::from(id),
                    name: String::new(),
                },
            }),
            etrier: wire.etrier.map(|e| match e {
                Ref::Populated(etrier) => etrier,
                Ref::Id(id) => Etrier {
                    id: EtrierId::from(id),
                    car_model: String::new(),
                },
            }),
            position: wire.position,
            assigned_user: wire.user.map(|u| match u {
                Ref::Populated(user) => user.id,
                Ref::Id(id) => user::Id::from(id),
            }),
            state,
            is_returned,
            delivered: wire.delivered.is_some_and(|d| d.is_set()),
            return_status,
            return_reason: wire.return_reason,
            serial: serial.filter(|s| match s {
                Serial::Plain(s) | Serial::Wrapped(s) => !s.is_empty(),
            }),
            observation: wire.observation,
            parts: PartsLedger::from_wire(
                &wire.extra.pieces,
                &wire.extra.piece_counters,
            ),
            created_at: wire.date,
            updated_at: wire.updated_at,
        }
    }
}

/// Intake form for a new reception.
#[derive(Clone, Debug)]
pub struct NewReception {
    pub client: CustomerId,
    pub etrier: EtrierId,
    pub position: Position,
    pub observation: String,
}
