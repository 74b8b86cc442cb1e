//! Customer returns.
//!
//! A technician files a request with a reason, an administrator approves it
//! and then completes it. Completion is what flags the item as returned.
//! An administrator skips the request and does both steps at once through
//! [`Workflow::confirm_return`].

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    session::{Action, Session},
    Error,
};

use super::{Id, Reception, ReceptionStore, State, Workflow};

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    #[default]
    #[display("none")]
    None,
    #[display("requested")]
    Requested,
    #[display("approved")]
    Approved,
    #[display("completed")]
    Completed,
}

impl Reception {
    /// Items can come back once they left the bench.
    fn check_returnable(&self) -> Result<(), Error> {
        if self.state == State::Received && !self.is_returned {
            return Err(Error::invalid_transition(
                &self.id,
                "a repair that was not started cannot be returned",
            ));
        }
        Ok(())
    }

    pub fn request_return(
        &mut self,
        reason: &str,
        at: OffsetDateTime,
    ) -> Result<(), Error> {
        self.check_returnable()?;
        if !matches!(
            self.return_status,
            ReturnStatus::None | ReturnStatus::Completed,
        ) {
            return Err(Error::invalid_transition(
                &self.id,
                format!("a return is already {}", self.return_status),
            ));
        }
        self.return_status = ReturnStatus::Requested;
        self.return_reason = Some(reason.to_owned());
        self.updated_at = Some(at);
        Ok(())
    }

    pub fn approve_return(&mut self, at: OffsetDateTime) -> Result<(), Error> {
        self.check_returnable()?;
        if self.return_status == ReturnStatus::Approved {
            return Err(Error::invalid_transition(
                &self.id,
                "return already approved",
            ));
        }
        self.return_status = ReturnStatus::Approved;
        self.updated_at = Some(at);
        Ok(())
    }

    /// Flags the item as returned. `delivered` is left as is.
    pub fn complete_return(&mut self, at: OffsetDateTime) -> Result<(), Error> {
        if self.return_status != ReturnStatus::Approved {
            return Err(Error::invalid_transition(
                &self.id,
                format!(
                    "only an approved return can be completed, this one is {}",
                    self.return_status,
                ),
            ));
        }
        self.return_status = ReturnStatus::Completed;
        self.is_returned = true;
        self.updated_at = Some(at);
        Ok(())
    }
}

impl<S: ReceptionStore> Workflow<S> {
    /// Files a return request. Administrators confirm the return directly,
    /// in which case `reason` is not used.
    pub async fn request_return(
        &self,
        session: &Session,
        id: &Id,
        reason: Option<&str>,
    ) -> Result<Reception, Error> {
        if session.is_admin() {
            return self.confirm_return(session, id).await;
        }
        session.authorize(Action::RequestReturn)?;
        let reason = reason.map(str::trim).unwrap_or_default();
        if reason.is_empty() {
            return Err(Error::Validation(
                "a reason is required to request a return".to_owned(),
            ));
        }

        let mut reception = self.store.get_reception(id).await?;
        reception.request_return(reason, OffsetDateTime::now_utc())?;
        self.store.request_return(id, reason).await?;

        info!(%id, reason, "return requested");
        Ok(reception)
    }

    pub async fn approve_return(
        &self,
        session: &Session,
        id: &Id,
    ) -> Result<Reception, Error> {
        session.authorize(Action::ApproveReturn)?;

        let reception = self.store.get_reception(id).await?;
        self.approve(reception).await
    }

    pub async fn complete_return(
        &self,
        session: &Session,
        id: &Id,
    ) -> Result<Reception, Error> {
        session.authorize(Action::CompleteReturn)?;

        let reception = self.store.get_reception(id).await?;
        self.complete(reception).await
    }

    /// Approves and completes a return in one go.
    ///
    /// The two writes are independent. When completion fails after the
    /// approval went through, the error says so: the reception is left
    /// approved and [`Workflow::complete_return`] finishes the job.
    pub async fn confirm_return(
        &self,
        session: &Session,
        id: &Id,
    ) -> Result<Reception, Error> {
        session.authorize(Action::ApproveReturn)?;
        session.authorize(Action::CompleteReturn)?;

        let reception = self.store.get_reception(id).await?;
        let approved = self.approve(reception).await?;
        self.complete(approved).await.map_err(|e| {
            warn!(%id, error = %e, "return approved but not completed");
            Error::ReturnNotCompleted {
                id: id.clone(),
                source: Box::new(e),
            }
        })
    }

    async fn approve(&self, mut reception: Reception) -> Result<Reception, Error> {
        reception.approve_return(OffsetDateTime::now_utc())?;
        self.store.approve_return(&reception.id).await?;

        info!(id = %reception.id, "return approved");
        Ok(reception)
    }

    async fn complete(
        &self,
        mut reception: Reception,
    ) -> Result<Reception, Error> {
        reception.complete_return(OffsetDateTime::now_utc())?;
        self.store.complete_return(&reception.id).await?;

        info!(id = %reception.id, "return completed");
        Ok(reception)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::{
        api::user::{self, Role, User},
        reception::{fixture, workflow::testing::FakeStore, Status},
    };

    fn session(role: Role) -> Session {
        Session::new(
            "token",
            User {
                id: user::Id::from("u1"),
                name: "Nadia".to_owned(),
                role,
            },
        )
    }

    fn finished(id: &str) -> Reception {
        Reception {
            state: State::Finished,
            delivered: true,
            ..fixture::reception(id)
        }
    }

    #[test]
    fn completion_requires_approval() {
        let at = datetime!(2025-04-01 10:00 UTC);
        let mut reception = finished("r1");

        reception.request_return("bruit au freinage", at).unwrap();
        assert!(matches!(
            reception.complete_return(at),
            Err(Error::InvalidTransition(_)),
        ));
        assert!(!reception.is_returned);

        reception.approve_return(at).unwrap();
        reception.complete_return(at).unwrap();
        assert!(reception.is_returned);
        assert_eq!(reception.return_status, ReturnStatus::Completed);
        assert!(reception.delivered);
    }

    #[test]
    fn unstarted_repair_cannot_be_returned() {
        let mut reception = fixture::reception("r1");

        let err = reception
            .request_return("fuite", datetime!(2025-04-01 10:00 UTC))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(reception.return_status, ReturnStatus::None);
    }

    #[test]
    fn pending_request_blocks_another() {
        let at = datetime!(2025-04-01 10:00 UTC);
        let mut reception = finished("r1");
        reception.request_return("fuite", at).unwrap();

        assert!(reception.request_return("encore", at).is_err());
        assert_eq!(reception.return_reason.as_deref(), Some("fuite"));
    }

    #[tokio::test]
    async fn technician_request_needs_reason() {
        let workflow = Workflow::new(FakeStore::with([finished("r1")]));

        for reason in [None, Some("   ")] {
            let err = workflow
                .request_return(&session(Role::User), &Id::from("r1"), reason)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(workflow.store().calls().is_empty());
    }

    #[tokio::test]
    async fn technician_request_awaits_admin() {
        let workflow = Workflow::new(FakeStore::with([finished("r1")]));
        let id = Id::from("r1");

        let requested = workflow
            .request_return(&session(Role::User), &id, Some(" bruit "))
            .await
            .unwrap();
        assert_eq!(requested.return_status, ReturnStatus::Requested);
        assert_eq!(requested.status(), Status::Finished);

        let err = workflow
            .complete_return(&session(Role::User), &id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        workflow.approve_return(&session(Role::Admin), &id).await.unwrap();
        let returned = workflow
            .complete_return(&session(Role::Admin), &id)
            .await
            .unwrap();
        assert_eq!(returned.status(), Status::Returned);

        let stored = workflow.store().get("r1");
        assert!(stored.is_returned);
        assert_eq!(stored.return_reason.as_deref(), Some("bruit"));
    }

    #[tokio::test]
    async fn admin_request_confirms_return() {
        let workflow = Workflow::new(FakeStore::with([finished("r1")]));

        let returned = workflow
            .request_return(&session(Role::Admin), &Id::from("r1"), None)
            .await
            .unwrap();

        assert!(returned.is_returned);
        assert_eq!(
            workflow.store().calls(),
            vec!["get", "approve_return", "complete_return"],
        );
    }

    #[tokio::test]
    async fn reports_approval_left_behind() {
        let workflow = Workflow::new(FakeStore::with([finished("r1")]));
        workflow.store().fail_on("complete_return");

        let err = workflow
            .confirm_return(&session(Role::Admin), &Id::from("r1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::ReturnNotCompleted { ref id, .. } if id.as_str() == "r1"
        ));
        let stored = workflow.store().get("r1");
        assert_eq!(stored.return_status, ReturnStatus::Approved);
        assert!(!stored.is_returned);
    }

    #[test]
    fn reads_wire_spelling() {
        let status: ReturnStatus =
            serde_json::from_str(r#""approved""#).unwrap();
        assert_eq!(status, ReturnStatus::Approved);
    }
}
