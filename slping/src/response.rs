//! The JSON document a server returns to a status request.
//! [Server List Ping: Status Response](https://wiki.vg/Server_List_Ping#Status_Response)

use serde::Deserialize;

use crate::Error;

/// The server status response.
///
/// Only `players.online` and `players.max` are required; everything else is
/// optional and unknown fields are ignored, so servers that decorate the
/// response with extra data still parse.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Information about online players.
    pub players: Players,
    /// The version of the server.
    pub version: Option<Version>,
    /// The description of the server (MOTD).
    pub description: Option<Chat>,
    /// The server icon (a Base64-encoded PNG image)
    pub favicon: Option<String>,
    /// Does this server enforce chat signing?
    #[serde(rename = "enforcesSecureChat")]
    pub enforces_secure_chat: Option<bool>,
    /// Does this server have chat previews?
    #[serde(rename = "previewsChat")]
    pub previews_chat: Option<bool>,
}

impl StatusResponse {
    /// Decodes the raw payload read off the wire.
    ///
    /// # Errors
    /// [`Error::InvalidUtf8`] if the bytes aren't UTF-8 and [`Error::Json`] if
    /// they aren't a status document with integer player counts.
    pub fn from_payload(payload: Vec<u8>) -> Result<Self, Error> {
        let text = String::from_utf8(payload)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Names from the player sample, in the order the server sent them.
    pub fn sample_names(&self) -> impl Iterator<Item = &str> {
        self.players
            .sample
            .iter()
            .flatten()
            .map(|player| player.name.as_str())
    }

    /// The MOTD as plain text, empty if the server sent none.
    #[must_use]
    pub fn motd(&self) -> &str {
        self.description.as_ref().map_or("", Chat::text)
    }
}

/// Information about the server's version
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    /// The name of the version the server is running
    ///
    /// In practice this comes in a large variety of different formats.
    #[serde(default)]
    pub name: String,
    /// See [Protocol Version Numbers](https://wiki.vg/Protocol_version_numbers)
    #[serde(default)]
    pub protocol: i64,
}

/// An online player of the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Player {
    pub name: String,
    /// The player's UUID. Some servers leave it out of hand-crafted samples.
    pub id: Option<String>,
}

/// The stats for players on the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Players {
    pub max: i64,
    pub online: i64,
    /// A preview of which players are online
    ///
    /// In practice servers often don't send this or use it for more advertising
    pub sample: Option<Vec<Player>>,
}

/// The MOTD, either a bare string or a chat component.
///
/// Only the top-level `text` of a component is kept; anything fancier is
/// accepted and rendered as empty text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Chat {
    String(String),
    Text { text: String },
    Other(serde_json::Value),
}

impl Chat {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::String(s) | Self::Text { text: s } => s.as_str(),
            Self::Other(_) => "",
        }
    }
}
