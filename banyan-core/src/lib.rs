//! Banyan Core
//!
//! Host-facing contract for the Banyan provider: the attribute bag handed to
//! every lifecycle call, attribute schemas, the adapter traits the host
//! drives, and small utilities (schema-aware diffing, bounded retry).

pub mod differ;
pub mod provider;
pub mod resource;
pub mod retry;
pub mod schema;
