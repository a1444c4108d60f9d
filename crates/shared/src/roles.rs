//! Role strings stored on profiles.
//!
//! A role string is a base role optionally decorated with prefixes:
//! `test_` marks a test account and `inactive_` marks a deactivated one.
//! The canonical form places `inactive_` outermost, e.g. `inactive_test_staff`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix marking a deactivated account.
pub const INACTIVE_PREFIX: &str = "inactive_";

/// Prefix marking a test account.
pub const TEST_PREFIX: &str = "test_";

/// Error type for role string parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("Role string is empty")]
    Empty,

    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Base role without any account-state decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseRole {
    Admin,
    Staff,
    Customer,
}

impl BaseRole {
    pub const ALL: &'static [BaseRole] = &[BaseRole::Admin, BaseRole::Staff, BaseRole::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseRole::Admin => "admin",
            BaseRole::Staff => "staff",
            BaseRole::Customer => "customer",
        }
    }

    /// Returns true for roles that work in the shop-staff portal.
    pub fn is_staff_side(&self) -> bool {
        matches!(self, BaseRole::Admin | BaseRole::Staff)
    }
}

impl FromStr for BaseRole {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(BaseRole::Admin),
            "staff" => Ok(BaseRole::Staff),
            "customer" => Ok(BaseRole::Customer),
            "" => Err(RoleError::Empty),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for BaseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed role string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserRole {
    pub base: BaseRole,
    pub active: bool,
    pub test: bool,
}

impl UserRole {
    /// An active, non-test role.
    pub fn new(base: BaseRole) -> Self {
        Self {
            base,
            active: true,
            test: false,
        }
    }

    /// The same role marked as a test account.
    pub fn as_test(self) -> Self {
        Self { test: true, ..self }
    }

    /// Flips the `inactive_` prefix. Nothing else changes.
    pub fn toggle_active(self) -> Self {
        Self {
            active: !self.active,
            ..self
        }
    }

    /// Replaces the base role, keeping the active and test flags.
    pub fn with_base(self, base: BaseRole) -> Self {
        Self { base, ..self }
    }

    /// Staff-side access (admin or staff) on an active account.
    pub fn is_staff_side(&self) -> bool {
        self.active && self.base.is_staff_side()
    }

    /// Administrative access on an active account.
    pub fn can_administer(&self) -> bool {
        self.active && self.base == BaseRole::Admin
    }

    /// Whether the role is in the allow-list. Inactive accounts never match.
    pub fn is_allowed(&self, allowed: &[BaseRole]) -> bool {
        self.active && allowed.contains(&self.base)
    }
}

impl FromStr for UserRole {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(RoleError::Empty);
        }

        let (active, rest) = match normalized.strip_prefix(INACTIVE_PREFIX) {
            Some(rest) => (false, rest),
            None => (true, normalized.as_str()),
        };
        let (test, rest) = match rest.strip_prefix(TEST_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        let base = rest
            .parse::<BaseRole>()
            .map_err(|_| RoleError::Unknown(s.trim().to_string()))?;

        Ok(Self { base, active, test })
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.active {
            f.write_str(INACTIVE_PREFIX)?;
        }
        if self.test {
            f.write_str(TEST_PREFIX)?;
        }
        f.write_str(self.base.as_str())
    }
}

impl Serialize for UserRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_roles() {
        assert_eq!("admin".parse(), Ok(UserRole::new(BaseRole::Admin)));
        assert_eq!("staff".parse(), Ok(UserRole::new(BaseRole::Staff)));
        assert_eq!("customer".parse(), Ok(UserRole::new(BaseRole::Customer)));
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        let role: UserRole = "  Inactive_Staff ".parse().unwrap();
        assert_eq!(role.base, BaseRole::Staff);
        assert!(!role.active);
    }

    #[test]
    fn test_parse_prefixed_variants() {
        let role: UserRole = "inactive_test_customer".parse().unwrap();
        assert_eq!(role.base, BaseRole::Customer);
        assert!(!role.active);
        assert!(role.test);

        let role: UserRole = "test_admin".parse().unwrap();
        assert!(role.active);
        assert!(role.test);
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert_eq!("".parse::<UserRole>(), Err(RoleError::Empty));
        assert_eq!(
            "mechanic".parse::<UserRole>(),
            Err(RoleError::Unknown("mechanic".to_string()))
        );
        // Prefixes in the wrong order are not canonical and are rejected.
        assert!("test_inactive_staff".parse::<UserRole>().is_err());
        assert!("inactive_".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        for raw in [
            "admin",
            "inactive_admin",
            "test_staff",
            "inactive_test_customer",
        ] {
            let role: UserRole = raw.parse().unwrap();
            assert_eq!(role.to_string(), raw);
        }
    }

    #[test]
    fn test_toggle_active_prepends_and_strips_prefix() {
        let role: UserRole = "test_staff".parse().unwrap();
        let toggled = role.toggle_active();
        assert_eq!(toggled.to_string(), "inactive_test_staff");
        assert_eq!(toggled.toggle_active(), role);
    }

    #[test]
    fn test_with_base_keeps_flags() {
        let role: UserRole = "inactive_test_customer".parse().unwrap();
        assert_eq!(
            role.with_base(BaseRole::Staff).to_string(),
            "inactive_test_staff"
        );
    }

    #[test]
    fn test_access_helpers() {
        let admin = UserRole::new(BaseRole::Admin);
        assert!(admin.can_administer());
        assert!(admin.is_staff_side());
        assert!(!admin.toggle_active().can_administer());

        let test_staff = UserRole::new(BaseRole::Staff).as_test();
        assert!(test_staff.is_staff_side());
        assert!(!test_staff.can_administer());
        assert!(test_staff.is_allowed(&[BaseRole::Admin, BaseRole::Staff]));
        assert!(!test_staff
            .toggle_active()
            .is_allowed(&[BaseRole::Admin, BaseRole::Staff]));
    }

    #[test]
    fn test_serde_uses_role_string() {
        let role: UserRole = "inactive_customer".parse().unwrap();
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"inactive_customer\"");
        let back: UserRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, role);
        assert!(serde_json::from_str::<UserRole>("\"wizard\"").is_err());
    }
}
