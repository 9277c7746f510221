//! Blocking status query over `std::net`.

use std::{
    io::{self, ErrorKind, Read, Write},
    net::{IpAddr, SocketAddr, TcpStream},
    time::{Duration, Instant},
};

use hickory_resolver::{Resolver, config::ResolverConfig, error::ResolveErrorKind};
use tracing::{debug, trace};

use crate::{
    Error, QueryError, ServerAddress, StatusResponse,
    packet::{read_framed_payload, status_exchange},
};

/// One budget shared by connect, write and every read of a query.
struct Deadline {
    at: Instant,
}

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    fn remaining(&self) -> io::Result<Duration> {
        let left = self.at.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(ErrorKind::TimedOut.into());
        }
        Ok(left)
    }
}

/// Re-arms the socket's read timeout with what is left of the deadline before
/// every read.
struct DeadlineReader<'a> {
    stream: &'a mut TcpStream,
    deadline: &'a Deadline,
}

impl Read for DeadlineReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.set_read_timeout(Some(self.deadline.remaining()?))?;
        self.stream.read(buf)
    }
}

/// Looks `address.host` up with a resolver whose request timeout is what is
/// left of the deadline. IP literals skip the lookup.
fn resolve(
    address: &ServerAddress,
    deadline: &Deadline,
    timeout: Duration,
) -> Result<Vec<IpAddr>, Error> {
    if let Ok(ip) = address.host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }
    let mut opts = crate::tokio::resolver_opts();
    opts.timeout = deadline.remaining().map_err(|e| Error::from_io(e, timeout))?;
    opts.attempts = 1;
    let resolver = Resolver::new(ResolverConfig::cloudflare(), opts)?;
    match resolver.lookup_ip(address.host.as_str()) {
        Ok(lookup) => Ok(lookup.iter().collect()),
        Err(err) if matches!(err.kind(), ResolveErrorKind::Timeout) => Err(Error::Timeout(timeout)),
        Err(err) => Err(err.into()),
    }
}

fn connect(ips: Vec<IpAddr>, port: u16, deadline: &Deadline) -> io::Result<Option<TcpStream>> {
    let mut last_err = None;
    for ip in ips {
        let addr = SocketAddr::new(ip, port);
        trace!(%addr, "connecting");
        match TcpStream::connect_timeout(&addr, deadline.remaining()?) {
            Ok(stream) => return Ok(Some(stream)),
            Err(e) => last_err = Some(e),
        }
    }
    last_err.map_or(Ok(None), Err)
}

fn exchange(address: &ServerAddress, timeout: Duration) -> Result<StatusResponse, Error> {
    let deadline = Deadline::after(timeout);
    let io_err = |e: io::Error| Error::from_io(e, timeout);

    let ips = resolve(address, &deadline, timeout)?;
    let mut stream = connect(ips, address.port, &deadline)
        .map_err(io_err)?
        .ok_or(Error::AddressNotFound)?;
    stream
        .set_write_timeout(Some(deadline.remaining().map_err(io_err)?))
        .map_err(io_err)?;
    stream
        .write_all(&status_exchange(&address.host, address.port))
        .map_err(io_err)?;

    let payload = read_framed_payload(&mut DeadlineReader {
        stream: &mut stream,
        deadline: &deadline,
    })
    .map_err(|e| match e {
        Error::Connection(e) => io_err(e),
        other => other,
    })?;
    drop(stream);

    StatusResponse::from_payload(payload)
}

/// Queries the server at `address`, waiting at most `timeout` in total.
///
/// Host names are resolved within the same budget. The connection is closed
/// before this returns, whatever the outcome.
///
/// Blocks the calling thread and must not be called from inside an async
/// runtime; use [`crate::tokio::query`] there.
///
/// # Examples
///
/// ```no_run
/// use slping::{query, ServerAddress, DEFAULT_TIMEOUT};
///
/// let address: ServerAddress = "mc.example.org".parse()?;
/// let response = query(&address, DEFAULT_TIMEOUT)?;
/// println!("{}/{} online", response.players.online, response.players.max);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
/// Any resolution, transport, framing or decoding failure, wrapped in a
/// [`QueryError`] naming `address`.
pub fn query(address: &ServerAddress, timeout: Duration) -> Result<StatusResponse, QueryError> {
    debug!(%address, ?timeout, "querying server status");
    exchange(address, timeout).map_err(|source| QueryError::new(address.clone(), source))
}
