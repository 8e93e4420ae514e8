use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles the backend issues. Wire strings are exact and lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Agent,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Agent, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-sensitive: "Admin" is not "admin".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Deserialize a role claim, mapping unrecognised or non-string values to
/// `None` instead of failing the whole payload.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Claim {
        #[serde(default, deserialize_with = "deserialize_lenient")]
        role: Option<Role>,
    }

    #[test]
    fn test_parse_exact_strings() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("agent".parse::<Role>(), Ok(Role::Agent));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
    }

    #[test]
    fn test_parse_rejects_other_casing() {
        assert!("Admin".parse::<Role>().is_err());
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_lenient_claim() {
        let known: Claim = serde_json::from_str(r#"{"role":"agent"}"#).unwrap();
        assert_eq!(known.role, Some(Role::Agent));

        let unknown: Claim = serde_json::from_str(r#"{"role":"Agent"}"#).unwrap();
        assert_eq!(unknown.role, None);

        let numeric: Claim = serde_json::from_str(r#"{"role":3}"#).unwrap();
        assert_eq!(numeric.role, None);

        let missing: Claim = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.role, None);
    }

    #[test]
    fn test_round_trip_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }
}
