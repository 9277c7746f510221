//! Loopback servers speaking just enough of the status protocol for tests.

use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    ServerAddress,
    packet::write_string,
    varint::{read_varint, write_varint},
};

pub const SCENARIO_A: &str = r#"{"players":{"online":3,"max":5,"sample":[{"name":"mf"},{"name":"dignity"},{"name":"viking"}]}}"#;

/// What the mock does once it has read a client's handshake and request.
#[derive(Clone)]
pub enum Reply {
    /// A well-formed status response carrying this JSON.
    Status(String),
    /// Same, written one byte at a time.
    Trickle(String),
    /// The response minus its last few bytes, then a close.
    Truncated(String),
    /// A status response, one byte every interval.
    Drip(Duration),
    /// Nothing; the socket is held open until the client gives up.
    Silent,
}

pub fn response_packet(json: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    write_varint(&mut payload, 0);
    write_string(&mut payload, json);
    let mut packet = Vec::new();
    write_varint(&mut packet, u32::try_from(payload.len()).unwrap());
    packet.extend(payload);
    packet
}

fn read_packet(stream: &mut TcpStream) -> Vec<u8> {
    let (len, _) = read_varint(stream).unwrap();
    let mut packet = vec![0; usize::try_from(len).unwrap()];
    stream.read_exact(&mut packet).unwrap();
    packet
}

/// Handshake and status-request payloads received on each connection.
pub type Requests = Vec<(Vec<u8>, Vec<u8>)>;

pub struct MockServer {
    pub address: ServerAddress,
    handle: JoinHandle<Requests>,
}

impl MockServer {
    /// Serves `connections` clients with `reply`, then stops listening so
    /// later connections are refused.
    pub fn start(reply: Reply, connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for _ in 0..connections {
                let (mut stream, _) = listener.accept().unwrap();
                let handshake = read_packet(&mut stream);
                let status_request = read_packet(&mut stream);
                requests.push((handshake, status_request));
                respond(&mut stream, &reply);
            }
            requests
        });
        Self {
            address: ServerAddress::new("127.0.0.1", port),
            handle,
        }
    }

    /// Waits for every expected connection to be served.
    pub fn join(self) -> Requests {
        self.handle.join().unwrap()
    }
}

fn respond(stream: &mut TcpStream, reply: &Reply) {
    match reply {
        Reply::Status(json) => stream.write_all(&response_packet(json)).unwrap(),
        Reply::Trickle(json) => {
            stream.set_nodelay(true).unwrap();
            for byte in response_packet(json) {
                stream.write_all(&[byte]).unwrap();
                thread::sleep(Duration::from_micros(200));
            }
        }
        Reply::Drip(interval) => {
            stream.set_nodelay(true).unwrap();
            for byte in response_packet(SCENARIO_A) {
                // the client hangs up once its deadline passes
                if stream.write_all(&[byte]).is_err() {
                    return;
                }
                thread::sleep(*interval);
            }
        }
        Reply::Truncated(json) => {
            let packet = response_packet(json);
            stream.write_all(&packet[..packet.len() - 8]).unwrap();
        }
        Reply::Silent => {
            // returns once the client closes its end
            let _ = stream.read(&mut [0; 1]);
        }
    }
}

/// An address nothing is listening on.
pub fn closed_port() -> ServerAddress {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    ServerAddress::new("127.0.0.1", port)
}
