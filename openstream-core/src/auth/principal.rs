//! Roles, operations and the capability check

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AuthError;

/// Role carried in a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Producer,
    Consumer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Consumer => "consumer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "producer" => Ok(Role::Producer),
            "consumer" => Ok(Role::Consumer),
            "admin" => Ok(Role::Admin),
            _ => Err(AuthError::InvalidClaims),
        }
    }
}

/// Operations guarded by a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ingest,
    Read,
    Ack,
    Claim,
    CreateGroup,
    ResetGroup,
    Describe,
    Summary,
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub sub: String,
    pub role: Role,
}

impl Principal {
    pub fn new(sub: impl Into<String>, role: Role) -> Self {
        Self {
            sub: sub.into(),
            role,
        }
    }

    /// Whether this caller may perform `operation`.
    pub fn can(&self, operation: Operation) -> bool {
        use Operation::*;
        match self.role {
            Role::Admin => true,
            Role::Producer => matches!(operation, Ingest | Describe | Summary),
            Role::Consumer => matches!(operation, Read | Ack | Claim | Describe | Summary),
        }
    }

    /// Like [`Principal::can`], as a `Result`.
    pub fn require(&self, operation: Operation) -> Result<(), AuthError> {
        if self.can(operation) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                role: self.role,
                operation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Operation; 8] = [
        Operation::Ingest,
        Operation::Read,
        Operation::Ack,
        Operation::Claim,
        Operation::CreateGroup,
        Operation::ResetGroup,
        Operation::Describe,
        Operation::Summary,
    ];

    #[test]
    fn admin_can_do_everything() {
        let admin = Principal::new("ops", Role::Admin);
        assert!(ALL.iter().all(|op| admin.can(*op)));
    }

    #[test]
    fn producer_capabilities() {
        let p = Principal::new("svc", Role::Producer);
        assert!(p.can(Operation::Ingest));
        assert!(p.can(Operation::Describe));
        assert!(!p.can(Operation::Read));
        assert!(!p.can(Operation::CreateGroup));
        assert!(matches!(
            p.require(Operation::Ack),
            Err(AuthError::Forbidden { role: Role::Producer, .. })
        ));
    }

    #[test]
    fn consumer_capabilities() {
        let c = Principal::new("worker", Role::Consumer);
        for op in [Operation::Read, Operation::Ack, Operation::Claim, Operation::Summary] {
            assert!(c.require(op).is_ok());
        }
        assert!(!c.can(Operation::Ingest));
        assert!(!c.can(Operation::ResetGroup));
    }

    #[test]
    fn role_parsing() {
        assert_eq!("consumer".parse::<Role>().unwrap(), Role::Consumer);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
