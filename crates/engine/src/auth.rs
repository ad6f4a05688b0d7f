use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Publisher,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "publisher" => Ok(Role::Publisher),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Publisher => f.write_str("publisher"),
        }
    }
}

/// The identity a job runs as.
#[derive(Debug, Clone)]
pub struct Principal {
    name: String,
    roles: HashSet<Role>,
}

impl Principal {
    pub fn new(name: &str) -> Self {
        Principal {
            name: name.to_string(),
            roles: HashSet::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Principal '{0}' lacks the admin role")]
    Forbidden(String),
}

/// Invoked once before an access-restricted job starts. Failure means
/// no job work is performed.
pub fn ensure_admin(principal: &Principal) -> Result<(), AuthError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden(principal.name().to_string()))
    }
}
