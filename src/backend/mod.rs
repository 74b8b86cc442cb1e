pub mod catalog;
pub mod reception;
pub mod user;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    api::{ErrorBody, List},
    config, Error,
};

/// Builds the REST client. `base_url` may or may not end with a slash.
pub fn connect(config: &config::Api) -> Result<Client, Error> {
    let inner = reqwest::Client::builder().timeout(config.timeout).build()?;
    Ok(Client {
        inner,
        base_url: config.base_url.trim_end_matches('/').to_owned(),
        auth_token: None,
    })
}

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl Client {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_auth_token(&mut self, token: Option<String>) {
        self.auth_token = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "request");
        let req = self.inner.request(method, format!("{}{path}", self.base_url));
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends `req`, turning transport failures and non-success statuses
    /// into [`Error`]s.
    async fn send(&self, req: RequestBuilder) -> Result<Response, Error> {
        let resp = req.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            Error::from(e)
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let url = resp.url().path().to_owned();
        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unknown error").to_owned()
            });
        warn!(%status, path = %url, reason = %message, "request rejected");

        Err(match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized,
            StatusCode::FORBIDDEN => Error::Forbidden(message),
            StatusCode::NOT_FOUND => Error::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Error::Validation(message)
            }
            StatusCode::CONFLICT => Error::InvalidTransition(message),
            _ => Error::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        Ok(self
            .send(self.request(Method::GET, path))
            .await?
            .json::<T>()
            .await?)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, Error> {
        self.fetch::<List<T>>(path).await.map(List::into_vec)
    }
}
