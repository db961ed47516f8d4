use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Account role, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Root,
    Tenant,
    Landlord,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Root => "root",
            Role::Tenant => "tenant",
            Role::Landlord => "landlord",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(Role::Root),
            "tenant" => Ok(Role::Tenant),
            "landlord" => Ok(Role::Landlord),
            other => Err(CoreError::validation(format!(
                "\"{}\" is not a valid role.",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [Role::Root, Role::Tenant, Role::Landlord] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = "admin".parse::<Role>().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let json: Result<Role, _> = serde_json::from_str(r#""Landlord""#);
        assert!(json.is_err());
    }
}
