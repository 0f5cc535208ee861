//! Permission checks.
//!
//! Authorization decisions are external: the executor asks an
//! [`AuthorizationOracle`] yes/no per operator permission and never
//! stores credentials itself. System-level full access short-circuits
//! the per-database checks.

use std::fmt;

use quarry_common::types::DatabaseId;

/// A permission an operator requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Read rows.
    Select,
    /// Insert rows.
    Insert,
    /// Update rows.
    Update,
    /// Delete rows.
    Delete,
    /// Create a table.
    CreateTable,
    /// Create a schema.
    CreateSchema,
    /// Change a table's storage policy.
    SetStoragePolicy,
    /// Unrestricted system-level access.
    FullAccess,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Select => "SELECT",
            Permission::Insert => "INSERT",
            Permission::Update => "UPDATE",
            Permission::Delete => "DELETE",
            Permission::CreateTable => "CREATE TABLE",
            Permission::CreateSchema => "CREATE SCHEMA",
            Permission::SetStoragePolicy => "SET STORAGE POLICY",
            Permission::FullAccess => "FULL ACCESS",
        };
        write!(f, "{name}")
    }
}

/// The external authorization collaborator.
pub trait AuthorizationOracle: Send + Sync {
    /// Returns true if the user holds a system-wide permission.
    fn user_has_system_permission(&self, user: &str, permission: Permission) -> bool;

    /// Returns true if the user holds a permission on one database.
    fn user_has_db_permission(
        &self,
        user: &str,
        password: &str,
        database_id: DatabaseId,
        permission: Permission,
    ) -> bool;
}

/// An oracle that grants everything (tests, embedded use).
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllOracle;

impl AuthorizationOracle for AllowAllOracle {
    fn user_has_system_permission(&self, _user: &str, _permission: Permission) -> bool {
        true
    }

    fn user_has_db_permission(
        &self,
        _user: &str,
        _password: &str,
        _database_id: DatabaseId,
        _permission: Permission,
    ) -> bool {
        true
    }
}

/// An oracle that denies everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAllOracle;

impl AuthorizationOracle for DenyAllOracle {
    fn user_has_system_permission(&self, _user: &str, _permission: Permission) -> bool {
        false
    }

    fn user_has_db_permission(
        &self,
        _user: &str,
        _password: &str,
        _database_id: DatabaseId,
        _permission: Permission,
    ) -> bool {
        false
    }
}
