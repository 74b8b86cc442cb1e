use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Deserialize,
            Display,
            Eq,
            From,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

string_id!(CustomerId);
string_id!(EtrierId);
string_id!(PartId);

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Customer {
    #[serde(rename = "_id", alias = "id")]
    pub id: CustomerId,
    #[serde(default)]
    pub name: String,
}

/// Caliper model a repair is done on.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Etrier {
    #[serde(rename = "_id", alias = "id")]
    pub id: EtrierId,
    #[serde(default)]
    pub car_model: String,
}

/// Spare part from the workshop catalog.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(rename = "_id", alias = "id")]
    pub id: PartId,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub reference_article: String,
    #[serde(default)]
    pub bar_code: Option<String>,
}
