//! Wire envelopes exchanged with browser clients
//!
//! Every frame is a JSON object tagged by `type`. The relay only looks at the
//! tag (and `roomID` for joins); everything else is opaque.

use crate::error::ClientRequestError;
use crate::state::RoomId;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Message types forwarded untouched to the other member of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Offer,
    Answer,
    Candidate,
    MicStatus,
    CameraStatus,
}

impl RelayKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "offer" => Some(Self::Offer),
            "answer" => Some(Self::Answer),
            "candidate" => Some(Self::Candidate),
            "mic-status" => Some(Self::MicStatus),
            "camera-status" => Some(Self::CameraStatus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
            Self::MicStatus => "mic-status",
            Self::CameraStatus => "camera-status",
        }
    }
}

impl fmt::Display for RelayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed client -> server frame
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    /// `{"type":"join","roomID":"..."}`
    Join { room_id: RoomId },
    /// A relay message; `raw` is the frame text exactly as received
    Relay { kind: RelayKind, raw: String },
}

impl FromStr for ClientRequest {
    type Err = ClientRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)?;
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ClientRequestError::MissingType)?;

        if tag == "join" {
            // Non-string room ids are rejected rather than coerced
            let room = value
                .get("roomID")
                .and_then(Value::as_str)
                .ok_or(ClientRequestError::MissingRoomId)?;
            return Ok(ClientRequest::Join {
                room_id: RoomId(room.to_string()),
            });
        }

        match RelayKind::from_tag(tag) {
            Some(kind) => Ok(ClientRequest::Relay {
                kind,
                raw: s.to_string(),
            }),
            None => Err(ClientRequestError::UnsupportedType(tag.to_string())),
        }
    }
}

/// Server -> client notifications generated by the relay itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Join accepted; `users` is the member count after joining
    Joined { users: usize },
    RoomFull,
    UserJoined,
    UserLeft,
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join() {
        let req: ClientRequest = r#"{"type":"join","roomID":"r1"}"#.parse().unwrap();
        assert_eq!(
            req,
            ClientRequest::Join {
                room_id: RoomId("r1".to_string())
            }
        );
    }

    #[test]
    fn relay_keeps_raw_text() {
        let raw = r#"{"type":"offer","offer":{"sdp":"v=0\r\n","type":"offer"}}"#;
        match raw.parse::<ClientRequest>().unwrap() {
            ClientRequest::Relay { kind, raw: kept } => {
                assert_eq!(kind, RelayKind::Offer);
                assert_eq!(kept, raw);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn status_messages_are_relayed() {
        let req: ClientRequest = r#"{"type":"camera-status","enabled":false}"#.parse().unwrap();
        assert!(matches!(
            req,
            ClientRequest::Relay {
                kind: RelayKind::CameraStatus,
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(
            "not json".parse::<ClientRequest>(),
            Err(ClientRequestError::Json(_))
        ));
        assert!(matches!(
            "[1,2]".parse::<ClientRequest>(),
            Err(ClientRequestError::MissingType)
        ));
        assert!(matches!(
            r#"{"type":7}"#.parse::<ClientRequest>(),
            Err(ClientRequestError::MissingType)
        ));
        assert!(matches!(
            r#"{"type":"join","roomID":42}"#.parse::<ClientRequest>(),
            Err(ClientRequestError::MissingRoomId)
        ));
        assert!(matches!(
            r#"{"type":"chat","text":"hi"}"#.parse::<ClientRequest>(),
            Err(ClientRequestError::UnsupportedType(t)) if t == "chat"
        ));
    }

    #[test]
    fn server_events_serialize_with_kebab_tags() {
        assert_eq!(
            ServerEvent::Joined { users: 2 }.to_string(),
            r#"{"type":"joined","users":2}"#
        );
        assert_eq!(ServerEvent::RoomFull.to_string(), r#"{"type":"room-full"}"#);
        assert_eq!(ServerEvent::UserJoined.to_string(), r#"{"type":"user-joined"}"#);
        assert_eq!(ServerEvent::UserLeft.to_string(), r#"{"type":"user-left"}"#);
    }
}
