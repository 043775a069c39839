//! utils for kodo-sdk

pub mod auth;
pub mod helper;

mod error;
pub use error::Error;
