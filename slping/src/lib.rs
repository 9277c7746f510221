#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! `slping` is a client for the Minecraft Java edition
//! [Server List Ping](https://wiki.vg/Server_List_Ping) protocol. It asks a
//! server for its player counts and a sample of online player names without
//! logging in.
//!
//! Two layers are exposed:
//!
//! * [`query`] (and its async twin [`tokio::query`]) runs one handshake and
//!   returns the decoded [`StatusResponse`].
//! * [`ServerStatus`] caches the last known availability of one server and is
//!   refreshed on demand. A failed refresh never raises; it resets the handle to
//!   "unavailable".

pub mod packet;
pub mod tokio;
pub mod varint;

mod address;
mod handle;
mod response;
mod session;

#[cfg(test)]
mod mock;

use std::time::Duration;

pub use address::{AddressError, ServerAddress};
pub use handle::{Availability, Report, ServerStatus};
pub use response::{Chat, Player, Players, StatusResponse, Version};
pub use session::query;

/// The port a Java edition server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 25565;

/// How long a query may take before it is abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while talking to a server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),
    #[error("DNS lookup failed: {0}")]
    DnsLookupFailed(#[from] hickory_resolver::error::ResolveError),
    #[error("the host did not resolve to any address")]
    AddressNotFound,
    #[error("VarInt did not terminate within 5 bytes")]
    VarIntTooLong,
    #[error("declared payload length {0} exceeds the 1 MiB limit")]
    PayloadTooLarge(u64),
    #[error("status payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("a JSON error occurred: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the server answered but with something this client can't use.
    ///
    /// Useful to tell "offline" apart from "speaks an incompatible protocol".
    #[must_use]
    pub const fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            Self::PayloadTooLarge(_) | Self::InvalidUtf8(_) | Self::Json(_)
        )
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Folds socket timeouts into [`Error::Timeout`]; everything else stays a
    /// connection error.
    pub(crate) fn from_io(err: std::io::Error, timeout: Duration) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Self::Timeout(timeout),
            _ => Self::Connection(err),
        }
    }
}

/// A failed query, carrying the server it was aimed at and the cause.
#[derive(Debug, thiserror::Error)]
#[error("failed to query {address}: {source}")]
pub struct QueryError {
    pub address: ServerAddress,
    #[source]
    pub source: Error,
}

impl QueryError {
    pub(crate) const fn new(address: ServerAddress, source: Error) -> Self {
        Self { address, source }
    }

    #[must_use]
    pub const fn is_malformed_response(&self) -> bool {
        self.source.is_malformed_response()
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }
}
