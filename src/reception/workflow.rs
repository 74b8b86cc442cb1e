use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    api::reception::{self as wire, Etat},
    session::{Action, Session},
    Error,
};

use super::{Id, NewReception, PartsLedger, Reception, Serial, State};

/// Remote authority committing reception changes.
///
/// Every mutation is an independent call: nothing here is transactional and
/// the last write wins.
#[async_trait]
pub trait ReceptionStore: Send + Sync {
    async fn list_receptions(&self) -> Result<Vec<Reception>, Error>;

    async fn get_reception(&self, id: &Id) -> Result<Reception, Error>;

    async fn create_reception(
        &self,
        reception: &wire::NewReception,
    ) -> Result<Reception, Error>;

    async fn set_state(
        &self,
        id: &Id,
        state: State,
        serial_number: Option<&str>,
    ) -> Result<(), Error>;

    async fn mark_delivered(&self, id: &Id) -> Result<(), Error>;

    async fn request_return(&self, id: &Id, reason: &str) -> Result<(), Error>;

    async fn approve_return(&self, id: &Id) -> Result<(), Error>;

    async fn complete_return(&self, id: &Id) -> Result<(), Error>;

    /// Overwrites the whole parts set in one write.
    async fn replace_parts(
        &self,
        id: &Id,
        parts: &PartsLedger,
    ) -> Result<(), Error>;
}

impl Reception {
    pub fn start(&mut self, at: OffsetDateTime) -> Result<(), Error> {
        if self.state != State::Received {
            return Err(Error::invalid_transition(
                &self.id,
                format!("cannot start a repair that is {}", self.status()),
            ));
        }
        self.state = State::InProgress;
        self.updated_at = Some(at);
        Ok(())
    }

    /// Marks the repair finished. Returns whether `serial_number` was
    /// assigned: a reception keeps the first serial it was given.
    pub fn finish(
        &mut self,
        serial_number: &str,
        at: OffsetDateTime,
    ) -> Result<bool, Error> {
        // Returned items go back on the bench and are finished again.
        if self.state != State::InProgress && !self.is_returned {
            return Err(Error::invalid_transition(
                &self.id,
                format!("cannot finish a repair that is {}", self.status()),
            ));
        }
        self.state = State::Finished;
        let assigned = self.serial.is_none();
        if assigned {
            self.serial = Some(Serial::Plain(serial_number.to_owned()));
        }
        self.updated_at = Some(at);
        Ok(assigned)
    }

    pub fn deliver(&mut self, at: OffsetDateTime) -> Result<(), Error> {
        if self.delivered {
            return Err(Error::invalid_transition(&self.id, "already delivered"));
        }
        if !self.is_completed() {
            return Err(Error::invalid_transition(
                &self.id,
                format!("cannot deliver an item that is {}", self.status()),
            ));
        }
        self.delivered = true;
        self.updated_at = Some(at);
        Ok(())
    }
}

/// Applies lifecycle transitions on behalf of an operator.
///
/// Each operation checks the role first and validates its input, so a
/// refused operation never reaches the store. The current record is then
/// fetched, the transition is applied to it locally to check the state
/// precondition, and only then is the change sent to the store. The
/// returned record is that local view; list screens re-fetch.
pub struct Workflow<S> {
    pub(super) store: S,
}

impl<S: ReceptionStore> Workflow<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn receive(
        &self,
        session: &Session,
        reception: NewReception,
    ) -> Result<Reception, Error> {
        session.authorize(Action::Receive)?;

        let created = self
            .store
            .create_reception(&wire::NewReception {
                client: reception.client,
                etrier: reception.etrier,
                user: session.user_id().clone(),
                position: reception.position,
                observation: reception.observation.trim().to_owned(),
                etat: Etat::Recus,
            })
            .await?;

        info!(id = %created.id, number = %created.reception_number, "reception recorded");
        Ok(created)
    }

    pub async fn start(
        &self,
        session: &Session,
        id: &Id,
    ) -> Result<Reception, Error> {
        session.authorize(Action::Start)?;

        let mut reception = self.store.get_reception(id).await?;
        reception.start(OffsetDateTime::now_utc())?;
        self.store.set_state(id, State::InProgress, None).await?;

        info!(%id, "repair started");
        Ok(reception)
    }

    /// Finishes a repair under `serial_number`, which the caller picks,
    /// usually from [`super::serial::suggest`].
    pub async fn finish(
        &self,
        session: &Session,
        id: &Id,
        serial_number: &str,
    ) -> Result<Reception, Error> {
        session.authorize(Action::Finish)?;
        let serial_number = serial_number.trim();
        if serial_number.is_empty() {
            return Err(Error::Validation(
                "a serial number is required to finish a repair".to_owned(),
            ));
        }

        let mut reception = self.store.get_reception(id).await?;
        let assigned =
            reception.finish(serial_number, OffsetDateTime::now_utc())?;
        self.store
            .set_state(id, State::Finished, assigned.then_some(serial_number))
            .await?;

        info!(%id, serial = ?reception.serial_number(), "repair finished");
        Ok(reception)
    }

    pub async fn deliver(
        &self,
        session: &Session,
        id: &Id,
    ) -> Result<Reception, Error> {
        session.authorize(Action::Deliver)?;

        let mut reception = self.store.get_reception(id).await?;
        reception.deliver(OffsetDateTime::now_utc())?;
        self.store.mark_delivered(id).await?;

        info!(%id, "item delivered");
        Ok(reception)
    }

    pub async fn update_parts(
        &self,
        session: &Session,
        id: &Id,
        parts: PartsLedger,
    ) -> Result<Reception, Error> {
        session.authorize(Action::UpdateParts)?;

        let mut reception = self.store.get_reception(id).await?;
        self.store.replace_parts(id, &parts).await?;
        reception.parts = parts;

        info!(%id, parts = reception.parts.len(), "parts saved");
        Ok(reception)
    }
}
