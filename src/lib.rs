pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod recap;
pub mod reception;
pub mod session;
pub mod users;
pub mod view;

pub use self::{config::Config, error::Error, session::Session};
