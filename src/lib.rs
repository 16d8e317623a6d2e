#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod history;
pub mod query;
pub mod scan;
pub mod session;
pub mod store;
pub mod transfer;
