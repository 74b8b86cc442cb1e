use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

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

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Workshop manager: delivers items, settles returns, manages accounts.
    #[display("admin")]
    Admin,

    /// Technician working the repair bench.
    #[default]
    #[display("user")]
    User,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginInput {
    pub name: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewUser {
    pub name: String,
    pub password: String,
    pub role: Role,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DeleteUserInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
