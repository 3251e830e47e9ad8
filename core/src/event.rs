//! Command events carried on the event bus.
//!
//! On the wire every message is a JSON object `{"type": ..., "data": ...}`.
//! The `type` is prefixed by the entity tag (`MOVIE_`, `TVSHOW_`) followed by
//! one of three command names:
//!
//! | Wire type                       | Meaning                                   |
//! |---------------------------------|-------------------------------------------|
//! | `MOVIE_CREATED`                 | a catalog service committed a write       |
//! | `MOVIE_CREATED_VIA_REST`        | the gateway created a record over REST    |
//! | `MOVIE_CREATED_VIA_GRAPHQL`     | the gateway created a record over GraphQL |
//! | `MOVIE_UPDATE_REQUEST`          | apply `data` over the record `data.id`    |
//! | `MOVIE_DELETE_REQUEST`          | remove the record `data.id`               |
//!
//! Anything else, including a type tagged for another entity kind, decodes to
//! [`CommandEvent::Unrecognized`] so consumers stay forward compatible.
//!
//! # Example
//!
//! ```
//! use catalog_core::event::{CommandEvent, SerializedEvent};
//! use catalog_core::record::EntityKind;
//!
//! let wire = br#"{"type":"MOVIE_DELETE_REQUEST","data":{"id":"42"}}"#;
//! let event = SerializedEvent::from_bytes(wire).unwrap();
//! let command = CommandEvent::decode(EntityKind::Movie, &event).unwrap();
//! assert_eq!(command, CommandEvent::DeleteRequest { id: "42".to_string() });
//! ```

use crate::record::{EntityKind, Record, RecordFields};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error types for event encoding and decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Failed to serialize an event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize an event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),

    /// The event payload lacks a field its type requires.
    #[error("Event {event_type} is missing field '{field}'")]
    MissingField {
        /// Wire type of the offending event.
        event_type: String,
        /// The absent field.
        field: &'static str,
    },
}

/// A bus message in its wire envelope.
///
/// This is the exact JSON shape exchanged with the bus: `{type, data}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// The wire type (e.g. `"MOVIE_UPDATE_REQUEST"`).
    #[serde(rename = "type")]
    pub event_type: String,

    /// Partial or full record payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(event_type: String, data: serde_json::Value) -> Self {
        Self { event_type, data }
    }

    /// Encode the envelope as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Decode an envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DeserializationError`] if the bytes are not a
    /// `{type, data}` JSON object.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }

    /// Partitioning key: the record id when the payload names one.
    ///
    /// Keying by id keeps every command about one record in one partition,
    /// which is the only ordering the bus guarantees.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        self.data
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(&self.event_type)
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event_type, self.data)
    }
}

/// Which surface produced a `CREATED` notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The catalog service itself, after a synchronous RPC write.
    Service,
    /// The gateway's REST surface.
    Rest,
    /// The gateway's GraphQL surface.
    GraphQl,
}

impl Origin {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Service => "",
            Self::Rest => "_VIA_REST",
            Self::GraphQl => "_VIA_GRAPHQL",
        }
    }
}

/// A decoded bus message, scoped to one entity kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandEvent {
    /// A write was committed. Observed only.
    Created {
        /// Producer of the notification.
        origin: Origin,
        /// The written record, or just its id for deletions.
        data: RecordFields,
    },
    /// Merge `fields` over the record `id`.
    UpdateRequest {
        /// Target record.
        id: String,
        /// Replacement values.
        fields: RecordFields,
    },
    /// Remove the record `id`.
    DeleteRequest {
        /// Target record.
        id: String,
    },
    /// A type this consumer does not handle.
    Unrecognized {
        /// The raw wire type.
        event_type: String,
    },
}

impl CommandEvent {
    /// Notification for a record committed through `origin`.
    #[must_use]
    pub fn created(origin: Origin, record: Record) -> Self {
        Self::Created {
            origin,
            data: record.into(),
        }
    }

    /// Wire type of this command for `kind`.
    #[must_use]
    pub fn event_type(&self, kind: EntityKind) -> String {
        let tag = kind.tag();
        match self {
            Self::Created { origin, .. } => format!("{tag}_CREATED{}", origin.suffix()),
            Self::UpdateRequest { .. } => format!("{tag}_UPDATE_REQUEST"),
            Self::DeleteRequest { .. } => format!("{tag}_DELETE_REQUEST"),
            Self::Unrecognized { event_type } => event_type.clone(),
        }
    }

    /// Encode into the wire envelope for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if the payload cannot be
    /// encoded.
    pub fn encode(&self, kind: EntityKind) -> Result<SerializedEvent, EventError> {
        let data = match self {
            Self::Created { data, .. } => to_value(data)?,
            Self::UpdateRequest { id, fields } => to_value(&RecordFields {
                id: Some(id.clone()),
                ..fields.clone()
            })?,
            Self::DeleteRequest { id } => to_value(&RecordFields::id(id.clone()))?,
            Self::Unrecognized { .. } => serde_json::Value::Null,
        };
        Ok(SerializedEvent::new(self.event_type(kind), data))
    }

    /// Decode a wire envelope as seen by a consumer of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DeserializationError`] if the payload of a known
    /// type is not a record shape, or [`EventError::MissingField`] if an
    /// update or delete does not name its target id.
    pub fn decode(kind: EntityKind, event: &SerializedEvent) -> Result<Self, EventError> {
        let Some(command) = event
            .event_type
            .strip_prefix(kind.tag())
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            return Ok(Self::unrecognized(event));
        };

        let origin = match command {
            "CREATED" => Some(Origin::Service),
            "CREATED_VIA_REST" => Some(Origin::Rest),
            "CREATED_VIA_GRAPHQL" => Some(Origin::GraphQl),
            "UPDATE_REQUEST" | "DELETE_REQUEST" => None,
            _ => return Ok(Self::unrecognized(event)),
        };

        let fields: RecordFields = serde_json::from_value(event.data.clone())
            .map_err(|e| EventError::DeserializationError(e.to_string()))?;

        if let Some(origin) = origin {
            return Ok(Self::Created {
                origin,
                data: fields,
            });
        }

        let id = fields.id.clone().ok_or_else(|| EventError::MissingField {
            event_type: event.event_type.clone(),
            field: "id",
        })?;

        if command == "UPDATE_REQUEST" {
            Ok(Self::UpdateRequest { id, fields })
        } else {
            Ok(Self::DeleteRequest { id })
        }
    }

    fn unrecognized(event: &SerializedEvent) -> Self {
        Self::Unrecognized {
            event_type: event.event_type.clone(),
        }
    }
}

fn to_value(fields: &RecordFields) -> Result<serde_json::Value, EventError> {
    serde_json::to_value(fields).map_err(|e| EventError::SerializationError(e.to_string()))
}
