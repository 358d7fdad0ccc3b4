//! Tagged event records of the routing/presence protocol
//!
//! Every frame on the wire is `{"event": <name>, "data": <payload>}` with
//! snake_case event names and camelCase payload keys. Malformed frames decode
//! to a [`WireError`] at the boundary instead of failing deep inside a
//! handler.

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::Result;
use crate::types::{PublicKey, Username};

/// Events sent by a client to the relay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Claim a username and publish a public key
    #[serde(rename_all = "camelCase")]
    Register {
        username: Username,
        public_key: PublicKey,
    },
    /// Ask for a peer's published public key
    RequestPublicKey { username: Username },
    /// Submit an encrypted envelope for a recipient
    #[serde(rename_all = "camelCase")]
    SendMessage {
        recipient: Username,
        encrypted_message: String,
        encrypted_key: String,
    },
    /// Fetch the caller's stored mailbox
    GetMessages,
}

impl ClientEvent {
    /// Decode from a JSON frame
    pub fn from_json(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode to a JSON frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Events sent by the relay to a client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Registration accepted; carries the full online roster
    #[serde(rename_all = "camelCase")]
    RegistrationSuccess {
        username: Username,
        online_users: Vec<Username>,
    },
    /// Registration rejected; caller only
    RegistrationFailed { message: String },
    /// A user came online; broadcast
    UserJoined(Username),
    /// A user went offline; broadcast
    UserLeft(Username),
    /// A peer's published public key; caller only
    #[serde(rename_all = "camelCase")]
    ReceivePublicKey {
        username: Username,
        public_key: PublicKey,
    },
    /// Key lookup failed; caller only
    PublicKeyError { message: String },
    /// Live delivery of an envelope to an online recipient
    NewMessage(Envelope),
    /// The caller's stored mailbox, in arrival order
    LoadMessages(Vec<Envelope>),
}

impl ServerEvent {
    /// Decode from a JSON frame
    pub fn from_json(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode to a JSON frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    #[test]
    fn register_decodes_with_camel_case_payload() {
        let frame = r#"{"event":"register","data":{"username":"alice","publicKey":"pem-blob"}}"#;
        let event = ClientEvent::from_json(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::Register {
                username: Username::from("alice"),
                public_key: PublicKey::from("pem-blob"),
            }
        );
    }

    #[test]
    fn get_messages_has_no_payload() {
        let event = ClientEvent::from_json(r#"{"event":"get_messages"}"#).unwrap();
        assert_eq!(event, ClientEvent::GetMessages);
        assert_eq!(
            ClientEvent::GetMessages.to_json().unwrap(),
            r#"{"event":"get_messages"}"#
        );
    }

    #[test]
    fn send_message_decodes_wire_keys() {
        let frame = r#"{"event":"send_message","data":{"recipient":"bob","encryptedMessage":"ct","encryptedKey":"ck"}}"#;
        let event = ClientEvent::from_json(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::SendMessage {
                recipient: Username::from("bob"),
                encrypted_message: "ct".to_string(),
                encrypted_key: "ck".to_string(),
            }
        );
    }

    #[test]
    fn user_joined_is_a_bare_string_payload() {
        let event = ServerEvent::UserJoined(Username::from("carol"));
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"event":"user_joined","data":"carol"}"#
        );
    }

    #[test]
    fn registration_success_uses_online_users_key() {
        let event = ServerEvent::RegistrationSuccess {
            username: Username::from("bob"),
            online_users: vec![Username::from("alice"), Username::from("bob")],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "registration_success");
        assert_eq!(value["data"]["onlineUsers"][0], "alice");
        assert_eq!(value["data"]["onlineUsers"][1], "bob");
    }

    #[test]
    fn load_messages_is_a_bare_array() {
        let envelope = Envelope::new(
            Username::from("alice"),
            "ct",
            "ck",
            Timestamp::from_millis(0).unwrap(),
        );
        let value = serde_json::to_value(&ServerEvent::LoadMessages(vec![envelope])).unwrap();
        assert!(value["data"].is_array());
        assert_eq!(value["data"][0]["encryptedMessage"], "ct");
    }

    #[test]
    fn malformed_frame_is_a_typed_error() {
        let err = ClientEvent::from_json(r#"{"event":"register","data":{}}"#);
        assert!(err.is_err());

        let err = ClientEvent::from_json("not json at all");
        assert!(err.is_err());
    }
}
