//! Polls a GitHub repository for newly opened issues and raises a desktop
//! notification for each one.

pub mod app_init;
pub mod client;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod domain;
pub mod id;
pub mod logging;
pub mod result;
pub mod sink;
