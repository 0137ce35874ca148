// src/errors.rs

//! Error types for every layer of the bot.
//!
//! Only `ConfigError` is fatal. Everything else is either absorbed into a
//! partial result, rendered as localized text, or logged and dropped.

use std::time::Duration;
use thiserror::Error;

/// Startup configuration problems. The process does not start on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingToken(&'static str),

    #[error("environment variable {key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// The argument supplied to a tool is missing or is not a host.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no target given")]
    Missing,

    #[error("{0:?} is not a hostname or IP address")]
    Invalid(String),
}

/// Name resolution outcome other than an address.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The name does not exist. A normal outcome reported to the user.
    #[error("no address found for {0}")]
    NotFound(String),

    /// Anything else the resolver could not handle. Propagates as a system error.
    #[error("resolver failure: {0}")]
    Resolver(#[from] hickory_resolver::error::ResolveError),
}

/// One enumeration source failed. Absorbed into a degraded outcome.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// The membership directory could not answer.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("membership request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("membership lookup rejected: {0}")]
    Api(String),
}

/// The chat transport failed to deliver or fetch something.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API error: {0}")]
    Api(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures escaping a tool handler. Rendered as the generic error text.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("could not stage attachment: {0}")]
    Io(#[from] std::io::Error),
}
