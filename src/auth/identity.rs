use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::role::{self, Role};

/// Who the stored credential says the current visitor is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_id: String,
    /// `None` when the claim is missing or not one of the known roles.
    pub role: Option<Role>,
    /// Expiry in seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Identity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

/// Raw payload segment of a bearer token.
///
/// Subject ids show up under several names depending on which backend
/// release issued the token, so each is read separately and merged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenClaims {
    #[serde(default, deserialize_with = "lenient_string")]
    first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "lenient_string")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    sub: Option<String>,
    #[serde(default, deserialize_with = "role::deserialize_lenient")]
    role: Option<Role>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    exp: Option<f64>,
}

/// Strings pass through and numbers are stringified. Anything else is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Seconds since the epoch, as a number or a numeric string.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Identity {
            first_name: claims.first_name.unwrap_or_default(),
            last_name: claims.last_name.unwrap_or_default(),
            email: claims.email.unwrap_or_default(),
            user_id: claims
                .user_id
                .or(claims.id)
                .or(claims.mongo_id)
                .or(claims.sub)
                .unwrap_or_default(),
            role: claims.role,
            exp: claims.exp.map(|exp| exp.floor() as i64),
        }
    }
}

/// Profile payload returned by login, register and profile endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "role::deserialize_lenient")]
    pub role: Option<Role>,
}

impl From<UserProfile> for Identity {
    fn from(profile: UserProfile) -> Self {
        Identity {
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            user_id: profile.id,
            role: profile.role,
            exp: None,
        }
    }
}
