#![doc = include_str!("../README.md")]

pub mod clock;
pub mod config;
pub mod credentials;
pub mod list;
pub mod region;
pub mod transport;

#[cfg(feature = "kodo")]
pub mod kodo;

#[cfg(feature = "pili")]
pub mod pili;

#[cfg(feature = "cdn")]
pub mod cdn;
