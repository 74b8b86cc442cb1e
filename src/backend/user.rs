use reqwest::Method;

use crate::{
    api::user::{self, DeleteUserInput, LoginInput, LoginOutput, NewUser, User},
    Error,
};

use super::Client;

impl Client {
    /// Exchanges credentials for a token. Does not install the token, see
    /// [`crate::Session::login`].
    pub async fn login(
        &self,
        name: &str,
        password: &str,
    ) -> Result<LoginOutput, Error> {
        let body = LoginInput {
            name: name.to_owned(),
            password: password.to_owned(),
        };
        Ok(self
            .send(self.request(Method::POST, "/users/login").json(&body))
            .await?
            .json::<LoginOutput>()
            .await?)
    }

    pub async fn users(&self) -> Result<Vec<User>, Error> {
        self.fetch_list("/users").await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, Error> {
        Ok(self
            .send(self.request(Method::POST, "/users/users").json(user))
            .await?
            .json::<User>()
            .await?)
    }

    /// Deletes an account. The password is required when the account is
    /// the caller's own.
    pub async fn delete_user(
        &self,
        id: &user::Id,
        password: Option<&str>,
    ) -> Result<(), Error> {
        let body = DeleteUserInput {
            password: password.map(str::to_owned),
        };
        self.send(
            self.request(Method::DELETE, &format!("/users/{id}")).json(&body),
        )
        .await
        .map(drop)
    }
}
