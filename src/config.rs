use std::{path::PathBuf, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub api: Api,
    pub credentials: Credentials,
}

#[derive(Deserialize)]
pub struct Api {
    pub base_url: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: time::Duration,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub path: PathBuf,
}

fn default_timeout() -> time::Duration {
    time::Duration::from_secs(10)
}
