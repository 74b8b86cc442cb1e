//! Authenticated operator context.
//!
//! A [`Session`] is restored from a [`CredentialStore`] at startup, created
//! by [`Session::login`] and torn down by [`Session::logout`]. Components
//! that need the operator's identity or role take it as an argument.

mod store;

use derive_more::Display;
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use tracing::{info, warn};

use crate::{
    api::user::{self, LoginOutput, Role, User},
    backend, Error,
};

pub use self::store::{CredentialStore, FileStore, MemoryStore};

pub const TOKEN_KEY: &str = "userToken";
pub const USER_KEY: &str = "userData";

/// Operations subject to a role check.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Action {
    #[display("record a reception")]
    Receive,
    #[display("start a repair")]
    Start,
    #[display("finish a repair")]
    Finish,
    #[display("update parts")]
    UpdateParts,
    #[display("request a return")]
    RequestReturn,
    #[display("mark an item delivered")]
    Deliver,
    #[display("approve a return")]
    ApproveReturn,
    #[display("complete a return")]
    CompleteReturn,
    #[display("view the monthly recap")]
    ViewRecap,
    #[display("manage user accounts")]
    ManageUsers,
}

impl Role {
    pub fn permits(self, action: Action) -> bool {
        use Action as A;

        match action {
            A::Receive | A::Start | A::Finish | A::UpdateParts => true,
            A::RequestReturn => self == Self::User,
            A::Deliver
            | A::ApproveReturn
            | A::CompleteReturn
            | A::ViewRecap
            | A::ManageUsers => self == Self::Admin,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    token: String,
    user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &user::Id {
        &self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn authorize(&self, action: Action) -> Result<(), Error> {
        if self.user.role.permits(action) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "role {} may not {action}",
                self.user.role,
            )))
        }
    }

    /// Logs in against the API, persists the credentials and points
    /// `client` at the new token.
    pub async fn login(
        client: &mut backend::Client,
        store: &impl CredentialStore,
        name: &str,
        password: &str,
    ) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "name and password are required".to_owned(),
            ));
        }

        let LoginOutput { token, user } = client.login(name, password).await?;

        store.set(TOKEN_KEY, &token).await?;
        store.set(USER_KEY, &serde_json::to_string(&user)?).await?;
        client.set_auth_token(Some(token.clone()));

        info!(user = %user.name, role = %user.role, "logged in");
        Ok(Self { token, user })
    }

    /// Session saved by a previous login, if any. An expired token or an
    /// unreadable profile is discarded along with the rest.
    pub async fn restore(
        store: &impl CredentialStore,
    ) -> Result<Option<Self>, Error> {
        let (Some(token), Some(user)) =
            (store.get(TOKEN_KEY).await?, store.get(USER_KEY).await?)
        else {
            return Ok(None);
        };

        if is_expired(&token) {
            warn!("saved token expired, clearing credentials");
            Self::logout(store).await?;
            return Ok(None);
        }

        match serde_json::from_str::<User>(&user) {
            Ok(user) => Ok(Some(Self { token, user })),
            Err(e) => {
                warn!(
                    error = %e,
                    "saved profile unreadable, clearing credentials",
                );
                Self::logout(store).await?;
                Ok(None)
            }
        }
    }

    pub async fn logout(store: &impl CredentialStore) -> Result<(), Error> {
        store.delete(TOKEN_KEY).await?;
        store.delete(USER_KEY).await?;
        info!("logged out");
        Ok(())
    }
}

/// Whether `token` is a JWT past its `exp` claim. The signature is the
/// server's business and is not checked; opaque tokens never expire here.
fn is_expired(token: &str) -> bool {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;

    match decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(&[]),
        &validation,
    ) {
        Err(e) => matches!(e.kind(), ErrorKind::ExpiredSignature),
        Ok(_) => false,
    }
}
