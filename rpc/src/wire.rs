//! Request and reply bodies of the RPC contract.

use catalog_core::error::CatalogError;
use catalog_core::record::{Record, RecordFields};
use serde::{Deserialize, Serialize};

/// Path prefix shared by every operation.
pub const RPC_PREFIX: &str = "/rpc";

/// Body of `lookup` and `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRequest {
    /// Target record.
    pub id: String,
}

/// Body of `search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Substring filter; absent or empty lists everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Body of `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    /// The record to persist.
    pub record: Record,
}

/// Body of `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Target record.
    pub id: String,
    /// Fields to merge over it.
    #[serde(default)]
    pub patch: RecordFields,
}

/// Reply carrying one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReply {
    /// The record.
    pub record: Record,
}

/// Reply carrying a list of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordsReply {
    /// The records, in store order.
    pub records: Vec<Record>,
}

/// Reply of `delete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// Fault body sent with every non-2xx reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Machine readable code (`NOT_FOUND`, `ALREADY_EXISTS`, ...).
    pub code: String,
    /// Human readable message.
    pub message: String,
}

impl From<&CatalogError> for Fault {
    fn from(error: &CatalogError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<Fault> for CatalogError {
    fn from(fault: Fault) -> Self {
        Self::from_code(&fault.code, fault.message)
    }
}
