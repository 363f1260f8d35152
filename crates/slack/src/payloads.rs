use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskhub_core::domain::task::{TaskId, TaskStatus, TeamMember};
use taskhub_core::errors::DomainError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("request body is not valid form encoding")]
    InvalidEncoding,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("interaction payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("interaction carries no action")]
    MissingAction,
    #[error("unrecognized callback `{0}`")]
    UnknownCallback(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Decodes an `application/x-www-form-urlencoded` body into key/value pairs.
/// `+` becomes a space; `%XX` escapes are percent-decoded.
pub fn parse_form(body: &[u8]) -> Result<Vec<(String, String)>, PayloadError> {
    body.split(|byte| *byte == b'&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut halves = segment.splitn(2, |byte| *byte == b'=');
            let key = halves.next().unwrap_or_default();
            let value = halves.next().unwrap_or_default();
            Ok((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

pub fn form_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
}

fn decode_component(raw: &[u8]) -> Result<String, PayloadError> {
    let mut decoded = Vec::with_capacity(raw.len());
    let mut index = 0usize;

    while index < raw.len() {
        match raw[index] {
            b'+' => {
                decoded.push(b' ');
                index += 1;
            }
            b'%' => {
                if index + 2 >= raw.len() {
                    return Err(PayloadError::InvalidEncoding);
                }
                let high = hex_nibble(raw[index + 1]).ok_or(PayloadError::InvalidEncoding)?;
                let low = hex_nibble(raw[index + 2]).ok_or(PayloadError::InvalidEncoding)?;
                decoded.push((high << 4) | low);
                index += 3;
            }
            byte => {
                decoded.push(byte);
                index += 1;
            }
        }
    }

    String::from_utf8(decoded).map_err(|_| PayloadError::InvalidEncoding)
}

fn hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}

/// `/addtask` and `/showlist` slash command form fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandForm {
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
}

impl SlashCommandForm {
    pub fn from_form(pairs: &[(String, String)]) -> Result<Self, PayloadError> {
        let channel_id = form_value(pairs, "channel_id")
            .filter(|value| !value.is_empty())
            .ok_or(PayloadError::MissingField("channel_id"))?;
        let user_id = form_value(pairs, "user_id")
            .filter(|value| !value.is_empty())
            .ok_or(PayloadError::MissingField("user_id"))?;
        let text = form_value(pairs, "text").unwrap_or_default();

        Ok(Self {
            text: text.trim().to_owned(),
            channel_id: channel_id.to_owned(),
            user_id: user_id.to_owned(),
        })
    }
}

/// The pending-task payload round-tripped opaquely through assignment prompt
/// buttons. The server never stores this; the client carries it until the
/// user confirms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAssignment {
    pub task: String,
    pub member: String,
    pub channel_id: String,
    pub dispatcher_id: String,
}

/// Closed set of button interactions, decoded once at the boundary and
/// matched exhaustively by the router.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    ConfirmAssignment { pending: PendingAssignment, user_id: String },
    ChangeStatus { task_id: TaskId, status: TaskStatus, user_id: String },
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    callback_id: String,
    user: RawUser,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct StatusChangeValue {
    task_id: i64,
    status: String,
}

const ASSIGN_CALLBACK: &str = "assign_task";
const STATUS_CALLBACK_PREFIX: &str = "change_status_";

impl Interaction {
    /// Decodes the `payload` field of a `POST /interactive` form.
    pub fn from_form(pairs: &[(String, String)]) -> Result<Self, PayloadError> {
        let payload = form_value(pairs, "payload")
            .filter(|value| !value.is_empty())
            .ok_or(PayloadError::MissingField("payload"))?;
        Self::from_payload_json(payload)
    }

    pub fn from_payload_json(payload: &str) -> Result<Self, PayloadError> {
        let raw: RawInteraction = serde_json::from_str(payload)
            .map_err(|error| PayloadError::InvalidJson(error.to_string()))?;
        let action = raw.actions.first().ok_or(PayloadError::MissingAction)?;

        if raw.callback_id == ASSIGN_CALLBACK {
            let pending: PendingAssignment = serde_json::from_str(&action.value)
                .map_err(|error| PayloadError::InvalidJson(error.to_string()))?;
            // Fail early on a roster change between prompt and confirmation.
            TeamMember::parse(&pending.member)?;
            return Ok(Self::ConfirmAssignment { pending, user_id: raw.user.id });
        }

        if raw.callback_id.starts_with(STATUS_CALLBACK_PREFIX) {
            let value: StatusChangeValue = serde_json::from_str(&action.value)
                .map_err(|error| PayloadError::InvalidJson(error.to_string()))?;
            let status = TaskStatus::parse(&value.status)?;
            return Ok(Self::ChangeStatus {
                task_id: TaskId(value.task_id),
                status,
                user_id: raw.user.id,
            });
        }

        Err(PayloadError::UnknownCallback(raw.callback_id))
    }
}

/// Events API envelope classification. Only the one-time URL verification
/// handshake is treated specially; everything else is acknowledged after
/// signature verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventEnvelope {
    UrlVerification { challenge: String },
    Other { kind: String },
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    challenge: Option<String>,
}

impl EventEnvelope {
    pub fn from_json(body: &[u8]) -> Result<Self, PayloadError> {
        let raw: RawEvent = serde_json::from_slice(body)
            .map_err(|error| PayloadError::InvalidJson(error.to_string()))?;

        if raw.kind == "url_verification" {
            let challenge = raw.challenge.ok_or(PayloadError::MissingField("challenge"))?;
            return Ok(Self::UrlVerification { challenge });
        }

        Ok(Self::Other { kind: raw.kind })
    }
}

#[cfg(test)]
mod tests {
    use taskhub_core::domain::task::{TaskId, TaskStatus};

    use super::{
        parse_form, EventEnvelope, Interaction, PayloadError, PendingAssignment, SlashCommandForm,
    };

    #[test]
    fn form_decoding_handles_plus_and_percent_escapes() {
        let pairs = parse_form(b"text=ship+the+%22big%22+report&channel_id=C123&user_id=U9")
            .expect("decode");

        let form = SlashCommandForm::from_form(&pairs).expect("form");
        assert_eq!(form.text, "ship the \"big\" report");
        assert_eq!(form.channel_id, "C123");
        assert_eq!(form.user_id, "U9");
    }

    #[test]
    fn form_decoding_rejects_truncated_escapes() {
        assert_eq!(parse_form(b"text=broken%2"), Err(PayloadError::InvalidEncoding));
        assert_eq!(parse_form(b"text=broken%zz"), Err(PayloadError::InvalidEncoding));
    }

    #[test]
    fn slash_form_requires_channel_and_user() {
        let pairs = parse_form(b"text=hello&user_id=U9").expect("decode");
        assert_eq!(
            SlashCommandForm::from_form(&pairs),
            Err(PayloadError::MissingField("channel_id"))
        );

        let pairs = parse_form(b"text=hello&channel_id=C1").expect("decode");
        assert_eq!(
            SlashCommandForm::from_form(&pairs),
            Err(PayloadError::MissingField("user_id"))
        );
    }

    #[test]
    fn classifies_assignment_confirmations() {
        let value = serde_json::to_string(&PendingAssignment {
            task: "prepare demo".to_owned(),
            member: "Nora".to_owned(),
            channel_id: "C1".to_owned(),
            dispatcher_id: "U1".to_owned(),
        })
        .expect("serialize");
        let payload = serde_json::json!({
            "callback_id": "assign_task",
            "user": {"id": "U2"},
            "actions": [{"name": "assign", "value": value}],
        })
        .to_string();

        let interaction = Interaction::from_payload_json(&payload).expect("classify");
        assert!(matches!(
            interaction,
            Interaction::ConfirmAssignment { ref pending, ref user_id }
                if pending.member == "Nora" && user_id == "U2"
        ));
    }

    #[test]
    fn rejects_assignment_for_unknown_member() {
        let payload = serde_json::json!({
            "callback_id": "assign_task",
            "user": {"id": "U2"},
            "actions": [{
                "name": "assign",
                "value": "{\"task\":\"x\",\"member\":\"Mallory\",\"channel_id\":\"C1\",\"dispatcher_id\":\"U1\"}",
            }],
        })
        .to_string();

        assert!(matches!(
            Interaction::from_payload_json(&payload),
            Err(PayloadError::Domain(_))
        ));
    }

    #[test]
    fn classifies_status_changes_from_callback_and_value() {
        let payload = serde_json::json!({
            "callback_id": "change_status_17",
            "user": {"id": "U5"},
            "actions": [{"name": "status", "value": "{\"task_id\":17,\"status\":\"in progress\"}"}],
        })
        .to_string();

        let interaction = Interaction::from_payload_json(&payload).expect("classify");
        assert_eq!(
            interaction,
            Interaction::ChangeStatus {
                task_id: TaskId(17),
                status: TaskStatus::InProgress,
                user_id: "U5".to_owned(),
            }
        );
    }

    #[test]
    fn rejects_unknown_callbacks_and_missing_actions() {
        let unknown = serde_json::json!({
            "callback_id": "launch_missiles",
            "user": {"id": "U5"},
            "actions": [{"name": "x", "value": "{}"}],
        })
        .to_string();
        assert!(matches!(
            Interaction::from_payload_json(&unknown),
            Err(PayloadError::UnknownCallback(ref id)) if id == "launch_missiles"
        ));

        let empty = serde_json::json!({
            "callback_id": "assign_task",
            "user": {"id": "U5"},
            "actions": [],
        })
        .to_string();
        assert_eq!(Interaction::from_payload_json(&empty), Err(PayloadError::MissingAction));
    }

    #[test]
    fn url_verification_events_expose_the_challenge() {
        let body = br#"{"type":"url_verification","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","token":"ignored"}"#;
        assert_eq!(
            EventEnvelope::from_json(body).expect("classify"),
            EventEnvelope::UrlVerification {
                challenge: "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".to_owned()
            }
        );

        let other = br#"{"type":"event_callback","event":{"type":"app_home_opened"}}"#;
        assert_eq!(
            EventEnvelope::from_json(other).expect("classify"),
            EventEnvelope::Other { kind: "event_callback".to_owned() }
        );
    }
}
