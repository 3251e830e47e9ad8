//! RPC between the gateway and the catalog services.
//!
//! Each catalog service exposes the [`CatalogRpc`] operations as JSON over
//! HTTP at one fixed address:
//!
//! ```text
//! POST /rpc/lookup  {id}          → {record}
//! POST /rpc/search  {query?}      → {records}
//! POST /rpc/create  {record}      → {record}
//! POST /rpc/update  {id, patch}   → {record}
//! POST /rpc/delete  {id}          → {}
//! ```
//!
//! Faults travel as a non-2xx status with a `{code, message}` body, where
//! `code` is [`CatalogError::code`](catalog_core::CatalogError::code).
//!
//! - **`server`**: axum router serving any [`CatalogRpc`] implementation
//! - **`client`**: reqwest client implementing [`CatalogRpc`] against that router
//! - **`directory`**: one client per entity kind, sharing a connection pool
//! - **`wire`**: request and reply bodies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod directory;
pub mod server;
pub mod wire;

pub use catalog_core::CatalogRpc;
pub use client::{ClientOptions, HttpCatalogClient, RpcError};
pub use directory::CatalogDirectory;
pub use server::{rpc_router, serve};
