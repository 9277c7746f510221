use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::DEFAULT_PORT;

/// A server to ping: a host name or IP and a port.
///
/// Parses from `host`, `host:port`, `[v6]` or `[v6]:port`; a missing port
/// means [`DEFAULT_PORT`].
///
/// # Examples
///
/// ```
/// use slping::ServerAddress;
///
/// let address: ServerAddress = "mc.example.org:25570".parse()?;
/// assert_eq!(address.host, "mc.example.org");
/// assert_eq!(address.port, 25570);
/// # Ok::<(), slping::AddressError>(())
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("the server address is empty")]
    Empty,
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    #[error("unterminated `[` in `{0}`")]
    UnclosedBracket(String),
}

fn parse_port(port: &str) -> Result<u16, AddressError> {
    port.parse()
        .map_err(|_| AddressError::InvalidPort(port.to_owned()))
}

impl FromStr for ServerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| AddressError::UnclosedBracket(s.to_owned()))?;
            let port = match tail.strip_prefix(':') {
                Some(port) => parse_port(port)?,
                None if tail.is_empty() => DEFAULT_PORT,
                None => return Err(AddressError::InvalidPort(tail.to_owned())),
            };
            if host.is_empty() {
                return Err(AddressError::Empty);
            }
            return Ok(Self::new(host, port));
        }

        match s.split_once(':') {
            // bare IPv6 literal, no port possible
            Some(_) if s.matches(':').count() > 1 => Ok(Self::new(s, DEFAULT_PORT)),
            Some(("", _)) => Err(AddressError::Empty),
            Some((host, port)) => Ok(Self::new(host, parse_port(port)?)),
            None => Ok(Self::new(s, DEFAULT_PORT)),
        }
    }
}
