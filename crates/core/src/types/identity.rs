//! Authenticated account profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, PlanTier, UserId, Username};

/// Profile of the signed-in account, as returned by the backend.
///
/// Fields the client does not model are kept in [`Identity::extra`] so a
/// profile survives a serialize/deserialize cycle (the demo-identity record)
/// without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend account ID, when the payload carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Unique account name.
    pub username: Username,
    /// Contact address (absent for some demo accounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// Subscription plan.
    #[serde(default)]
    pub plan: PlanTier,
    /// Account creation time.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Any other profile fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Create a minimal identity on the free plan.
    #[must_use]
    pub fn new(username: Username) -> Self {
        Self {
            id: None,
            username,
            email: None,
            plan: PlanTier::Free,
            created_at: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the email address.
    #[must_use]
    pub fn with_email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }

    /// Set the plan tier.
    #[must_use]
    pub const fn with_plan(mut self, plan: PlanTier) -> Self {
        self.plan = plan;
        self
    }
}

/// The backend emits both RFC 3339 timestamps and naive ones
/// (`2025-01-01T00:00:00`); naive values are taken as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };

        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(parsed.with_timezone(&Utc)));
        }

        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Some(naive.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, TimeZone};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_backend_profile() {
        let identity: Identity = serde_json::from_value(json!({
            "id": 12,
            "username": "alice",
            "email": "alice@example.com",
            "plan": "pro",
            "created_at": "2025-01-01T00:00:00"
        }))
        .unwrap();

        assert_eq!(identity.id, Some(UserId::new(12)));
        assert_eq!(identity.username.as_str(), "alice");
        assert_eq!(identity.plan, PlanTier::Pro);
        assert_eq!(
            identity.created_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(identity.extra.is_empty());
    }

    #[test]
    fn test_minimal_profile_defaults() {
        let identity: Identity = serde_json::from_value(json!({"username": "demo"})).unwrap();
        assert_eq!(identity.plan, PlanTier::Free);
        assert!(identity.email.is_none());
        assert!(identity.created_at.is_none());
    }

    #[test]
    fn test_rfc3339_timestamp() {
        let identity: Identity = serde_json::from_value(json!({
            "username": "bob",
            "created_at": "2024-06-30T23:00:00-02:00"
        }))
        .unwrap();
        let created = identity.created_at.unwrap();
        assert_eq!(created.month(), 7);
        assert_eq!(created.day(), 1);
    }

    #[test]
    fn test_extra_fields_survive_roundtrip() {
        let raw = json!({
            "username": "carol",
            "plan": "enterprise",
            "full_name": "Carol Example",
            "is_active": true
        });
        let identity: Identity = serde_json::from_value(raw).unwrap();
        assert_eq!(identity.extra.get("full_name"), Some(&json!("Carol Example")));

        let encoded = serde_json::to_value(&identity).unwrap();
        assert_eq!(encoded["full_name"], json!("Carol Example"));
        assert_eq!(encoded["is_active"], json!(true));
        assert_eq!(encoded["plan"], json!("enterprise"));
    }

    #[test]
    fn test_empty_username_rejected() {
        assert!(serde_json::from_value::<Identity>(json!({"username": ""})).is_err());
    }
}
