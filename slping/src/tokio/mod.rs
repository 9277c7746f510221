//! The status query on the tokio runtime.

mod read;

use std::{
    net::{IpAddr, SocketAddr},
    sync::OnceLock,
    time::Duration,
};

use ::tokio::{io::AsyncWriteExt, net::TcpStream};
use hickory_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
};
use tracing::{debug, trace};

pub use self::read::{read_framed_payload, read_varint};
use crate::{Error, QueryError, ServerAddress, StatusResponse, packet::status_exchange};

/// Queries the server at `address`; the whole exchange, name resolution
/// included, must finish within `timeout`.
///
/// Dropping the returned future closes the connection.
///
/// # Examples
///
/// ```no_run
/// # async {
/// use slping::{ServerAddress, DEFAULT_TIMEOUT};
///
/// let address: ServerAddress = "mc.example.org".parse()?;
/// let response = slping::tokio::query(&address, DEFAULT_TIMEOUT).await?;
/// println!("{}/{} online", response.players.online, response.players.max);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # };
/// ```
///
/// # Errors
/// Any resolution, transport, framing or decoding failure, wrapped in a
/// [`QueryError`] naming `address`.
pub async fn query(
    address: &ServerAddress,
    timeout: Duration,
) -> Result<StatusResponse, QueryError> {
    debug!(%address, ?timeout, "querying server status");
    let result = match ::tokio::time::timeout(timeout, exchange(address, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(timeout)),
    };
    result.map_err(|source| QueryError::new(address.clone(), source))
}

async fn exchange(address: &ServerAddress, timeout: Duration) -> Result<StatusResponse, Error> {
    let mut stream = connect(address, timeout).await?;
    stream
        .write_all(&status_exchange(&address.host, address.port))
        .await?;
    let payload = read_framed_payload(&mut stream).await?;
    drop(stream);
    StatusResponse::from_payload(payload)
}

async fn connect(address: &ServerAddress, timeout: Duration) -> Result<TcpStream, Error> {
    let ips: Vec<IpAddr> = match address.host.parse::<IpAddr>() {
        Ok(ip) => vec![ip],
        Err(_) => resolver().lookup_ip(address.host.as_str()).await?.iter().collect(),
    };

    let mut last_err = None;
    for ip in ips {
        let addr = SocketAddr::new(ip, address.port);
        trace!(%addr, "connecting");
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    last_err.map_or(Err(Error::AddressNotFound), |e| Err(Error::from_io(e, timeout)))
}

pub(crate) fn resolver_opts() -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.cache_size = 64;
    opts.attempts = 3;
    opts.use_hosts_file = true;
    opts
}

fn new_resolver() -> TokioAsyncResolver {
    TokioAsyncResolver::tokio(ResolverConfig::cloudflare(), resolver_opts())
}

/// The process-wide resolver. `/etc/hosts` is consulted before Cloudflare.
pub fn resolver() -> &'static TokioAsyncResolver {
    static RESOLVER: OnceLock<TokioAsyncResolver> = OnceLock::new();
    RESOLVER.get_or_init(new_resolver)
}
