//! Role-based access policy for the students resource.
//!
//! The policy table is a static mapping from [`Operation`] to the set of
//! [`Role`]s allowed to perform it. An operation without an entry is open to
//! every authenticated caller. The table is built once from configuration and
//! only read afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Caller role carried in the JWT claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Engine operations subject to the access gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    List,
    ReadOne,
    Create,
    Upsert,
    Patch,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::List,
        Operation::ReadOne,
        Operation::Create,
        Operation::Upsert,
        Operation::Patch,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::ReadOne => "readOne",
            Operation::Create => "create",
            Operation::Upsert => "upsert",
            Operation::Patch => "patch",
            Operation::Delete => "delete",
        }
    }

    /// Suffix used for `POLICY_<OPERATION>` environment overrides
    pub fn env_suffix(&self) -> &'static str {
        match self {
            Operation::List => "LIST",
            Operation::ReadOne => "READ_ONE",
            Operation::Create => "CREATE",
            Operation::Upsert => "UPSERT",
            Operation::Patch => "PATCH",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("role '{role}' is not allowed to {operation} students")]
pub struct AccessDenied {
    pub operation: Operation,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    rules: BTreeMap<Operation, BTreeSet<Role>>,
}

impl PolicyTable {
    /// Table with no restrictions at all
    pub fn open_to_all() -> Self {
        Self { rules: BTreeMap::new() }
    }

    pub fn restrict(&mut self, operation: Operation, roles: impl IntoIterator<Item = Role>) -> &mut Self {
        self.rules.insert(operation, roles.into_iter().collect());
        self
    }

    pub fn open(&mut self, operation: Operation) -> &mut Self {
        self.rules.remove(&operation);
        self
    }

    pub fn allowed_roles(&self, operation: Operation) -> Option<&BTreeSet<Role>> {
        self.rules.get(&operation)
    }

    /// Single decision point for every engine operation.
    pub fn authorize(&self, operation: Operation, role: Role) -> Result<(), AccessDenied> {
        match self.rules.get(&operation) {
            Some(allowed) if !allowed.contains(&role) => Err(AccessDenied { operation, role }),
            _ => Ok(()),
        }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        let mut table = Self::open_to_all();
        table
            .restrict(Operation::List, [Role::Teacher])
            .restrict(Operation::ReadOne, [Role::Teacher, Role::Parent])
            .restrict(Operation::Create, [Role::Teacher])
            .restrict(Operation::Upsert, [Role::Teacher])
            .restrict(Operation::Patch, [Role::Teacher, Role::Parent])
            .restrict(Operation::Delete, [Role::Teacher]);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_router_rules() {
        let table = PolicyTable::default();

        for op in [Operation::List, Operation::Create, Operation::Upsert, Operation::Delete] {
            assert!(table.authorize(op, Role::Teacher).is_ok(), "{op}");
            assert_eq!(
                table.authorize(op, Role::Parent),
                Err(AccessDenied { operation: op, role: Role::Parent })
            );
        }
        for op in [Operation::ReadOne, Operation::Patch] {
            assert!(table.authorize(op, Role::Teacher).is_ok());
            assert!(table.authorize(op, Role::Parent).is_ok());
        }
    }

    #[test]
    fn unrestricted_operation_is_open() {
        let mut table = PolicyTable::default();
        table.open(Operation::List);
        assert!(table.authorize(Operation::List, Role::Parent).is_ok());
        assert!(table.allowed_roles(Operation::List).is_none());
    }

    #[test]
    fn empty_role_set_denies_everyone() {
        let mut table = PolicyTable::open_to_all();
        table.restrict(Operation::Delete, []);
        assert!(table.authorize(Operation::Delete, Role::Teacher).is_err());
        assert!(table.authorize(Operation::Delete, Role::Parent).is_err());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" parent".trim().parse::<Role>(), Ok(Role::Parent));
        assert!("admin".parse::<Role>().is_err());
    }
}
