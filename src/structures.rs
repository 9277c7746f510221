use serde::{Deserialize, Serialize};
use slping::StatusResponse;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PingResponse {
    pub latency: u64,
    pub players: Players,
    pub motd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Version {
    pub protocol: i64,
    pub broadcast: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Players {
    pub online: i64,
    pub maximum: i64,
    pub sample: Vec<PlayerSample>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlayerSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub name: String,
}

impl PingResponse {
    pub fn new(latency: u64, response: StatusResponse) -> Self {
        let motd = response.motd().to_owned();
        let sample = response
            .players
            .sample
            .unwrap_or_default()
            .into_iter()
            .map(|player| PlayerSample {
                uuid: player.id,
                name: player.name,
            })
            .collect();
        Self {
            latency,
            players: Players {
                online: response.players.online,
                maximum: response.players.max,
                sample,
            },
            motd,
            icon: response.favicon,
            version: response.version.map(|version| Version {
                protocol: version.protocol,
                broadcast: version.name,
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorSerialization {
    pub error: String,
}
