//! Subscription plan tiers.

use serde::{Deserialize, Serialize};

/// Subscription plan attached to an account.
///
/// The backend reports it as a lowercase string; accounts created before
/// plans existed carry no value and are treated as [`PlanTier::Free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl PlanTier {
    /// Label shown next to the account name (e.g. `PRO`).
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Pro => "PRO",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
            Self::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(format!("invalid plan tier: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&PlanTier::Pro).unwrap(), "\"pro\"");
        let tier: PlanTier = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(tier, PlanTier::Enterprise);
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        assert!("platinum".parse::<PlanTier>().is_err());
        assert!(serde_json::from_str::<PlanTier>("\"platinum\"").is_err());
    }

    #[test]
    fn test_badge() {
        assert_eq!(PlanTier::default().badge(), "FREE");
        assert_eq!(PlanTier::Enterprise.badge(), "ENTERPRISE");
    }
}
