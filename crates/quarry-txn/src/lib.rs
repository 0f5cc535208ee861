//! # quarry-txn
//!
//! Locking and transaction batches for QuarryDB.
//!
//! This crate implements:
//! - **LockManager**: an all-or-nothing batch lock table over database,
//!   schema, table, and row objects
//! - **TransactionManager**: batch identity and the in-flight registry

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod lock;
pub mod manager;

pub use error::{TxnError, TxnResult};
pub use lock::{
    GrantedLock, LockKind, LockManager, LockRequest, LockStats, LockTarget, LockableKind,
};
pub use manager::{TransactionManager, TransactionRequest};
