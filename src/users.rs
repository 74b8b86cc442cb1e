//! Account administration.

use tracing::info;

use crate::{
    api::user::{self, NewUser, Role, User},
    backend,
    session::{Action, CredentialStore, Session},
    Error,
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Accounts other than the caller's.
pub async fn list_users(
    client: &backend::Client,
    session: &Session,
) -> Result<Vec<User>, Error> {
    session.authorize(Action::ManageUsers)?;

    let mut users = client.users().await?;
    users.retain(|u| &u.id != session.user_id());
    Ok(users)
}

pub async fn create_user(
    client: &backend::Client,
    session: &Session,
    name: &str,
    password: &str,
    role: Role,
) -> Result<User, Error> {
    session.authorize(Action::ManageUsers)?;
    let name = name.trim();
    if name.is_empty() || password.trim().is_empty() {
        return Err(Error::Validation(
            "name and password are required".to_owned(),
        ));
    }

    let user = client
        .create_user(&NewUser {
            name: name.to_owned(),
            password: password.to_owned(),
            role,
        })
        .await?;

    info!(id = %user.id, name = %user.name, %role, "user created");
    Ok(user)
}

/// Deletes another account. Use [`delete_account`] for one's own.
pub async fn delete_user(
    client: &backend::Client,
    session: &Session,
    id: &user::Id,
) -> Result<(), Error> {
    session.authorize(Action::ManageUsers)?;
    if id == session.user_id() {
        return Err(Error::Validation(
            "use delete-account to delete your own account".to_owned(),
        ));
    }

    client.delete_user(id, None).await?;

    info!(%id, "user deleted");
    Ok(())
}

/// Deletes the caller's account and ends the session.
pub async fn delete_account(
    client: &mut backend::Client,
    session: Session,
    store: &impl CredentialStore,
    password: &str,
) -> Result<(), Error> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters",
        )));
    }

    client.delete_user(session.user_id(), Some(password)).await?;
    Session::logout(store).await?;
    client.set_auth_token(None);

    info!(id = %session.user_id(), "account deleted");
    Ok(())
}
