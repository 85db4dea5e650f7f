//! Blocking client library for the urlscan.io API. Start at
//! [`client::Urlscan`].

pub mod client;
pub mod commands;
pub mod config;
pub mod retry;
