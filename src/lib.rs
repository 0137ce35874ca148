// src/lib.rs

//! A chat-driven reconnaissance assistant: subdomain enumeration, name resolution,
//! port probing and host metadata, gated by group membership.

rust_i18n::i18n!("locales", fallback = "en");

pub mod bot;
pub mod config;
pub mod core;
pub mod errors;
pub mod logging;
