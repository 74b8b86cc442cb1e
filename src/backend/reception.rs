use async_trait::async_trait;
use reqwest::Method;
use tracing::warn;

use crate::{
    api::{
        self,
        reception::{EtatInput, NewReception, ReturnRequestInput},
    },
    reception::{Id, PartsLedger, Reception, ReceptionStore, State},
    Error,
};

use super::Client;

impl Client {
    /// Sends a transition to `/receptions/{id}/{action}`. The response
    /// body is not used: callers re-fetch.
    async fn act(
        &self,
        method: Method,
        id: &Id,
        action: &str,
        body: Option<&impl serde::Serialize>,
    ) -> Result<(), Error> {
        let mut req = self.request(method, &format!("/receptions/{id}/{action}"));
        if let Some(body) = body {
            req = req.json(body);
        }
        self.send(req).await.map(drop)
    }
}

#[async_trait]
impl ReceptionStore for Client {
    async fn list_receptions(&self) -> Result<Vec<Reception>, Error> {
        let records = self.fetch_list::<serde_json::Value>("/receptions").await?;
        Ok(records
            .into_iter()
            .filter_map(|record| {
                let id = record
                    .get("_id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                match serde_json::from_value::<api::Reception>(record) {
                    Ok(r) => Some(Reception::from(r)),
                    Err(e) => {
                        warn!(%id, error = %e, "skipping undecodable reception");
                        None
                    }
                }
            })
            .collect())
    }

    async fn get_reception(&self, id: &Id) -> Result<Reception, Error> {
        self.fetch::<api::Reception>(&format!("/receptions/{id}"))
            .await
            .map(Reception::from)
    }

    async fn create_reception(
        &self,
        reception: &NewReception,
    ) -> Result<Reception, Error> {
        Ok(self
            .send(self.request(Method::POST, "/receptions").json(reception))
            .await?
            .json::<api::Reception>()
            .await?
            .into())
    }

    async fn set_state(
        &self,
        id: &Id,
        state: State,
        serial_number: Option<&str>,
    ) -> Result<(), Error> {
        let body = EtatInput {
            etat: state.into(),
            serial_number: serial_number.map(str::to_owned),
        };
        self.act(Method::PATCH, id, "etat", Some(&body)).await
    }

    async fn mark_delivered(&self, id: &Id) -> Result<(), Error> {
        self.act(Method::PATCH, id, "delivered", None::<&()>).await
    }

    async fn request_return(&self, id: &Id, reason: &str) -> Result<(), Error> {
        let body = ReturnRequestInput {
            reason: reason.to_owned(),
        };
        self.act(Method::POST, id, "request-return", Some(&body)).await
    }

    async fn approve_return(&self, id: &Id) -> Result<(), Error> {
        self.act(Method::PATCH, id, "approve-return", None::<&()>).await
    }

    async fn complete_return(&self, id: &Id) -> Result<(), Error> {
        self.act(Method::POST, id, "complete-return", None::<&()>).await
    }

    async fn replace_parts(
        &self,
        id: &Id,
        parts: &PartsLedger,
    ) -> Result<(), Error> {
        self.act(Method::PATCH, id, "extra", Some(&parts.to_input())).await
    }
}
