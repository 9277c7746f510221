use std::net::TcpListener as StdListener;

use slping::{packet::write_string, varint::write_varint, ServerAddress};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

fn response_packet(json: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    write_varint(&mut payload, 0);
    write_string(&mut payload, json);
    let mut packet = Vec::new();
    write_varint(&mut packet, u32::try_from(payload.len()).unwrap());
    packet.extend(payload);
    packet
}

/// Answers a single status query with `json`, then stops listening.
pub async fn spawn_status_server(json: &str) -> ServerAddress {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let packet = response_packet(json);
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        // handshake and status request arrive in one write, well under 256 bytes
        let mut request = [0; 256];
        let _ = stream.read(&mut request).await.unwrap();
        stream.write_all(&packet).await.unwrap();
    });
    ServerAddress::new("127.0.0.1", port)
}

pub fn closed_port() -> ServerAddress {
    let listener = StdListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    ServerAddress::new("127.0.0.1", port)
}
