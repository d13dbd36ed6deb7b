//! Role tiers: platform-wide (`admin`) and per-building (`committee`, `tenant`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    Admin,
    Committee,
    Tenant,
}

impl PlatformRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformRole::Admin => "admin",
            PlatformRole::Committee => "committee",
            PlatformRole::Tenant => "tenant",
        }
    }

    /// Returns true if this role may be assigned through the role-update
    /// endpoint. Committee is granted only through building membership.
    pub fn is_directly_assignable(&self) -> bool {
        matches!(self, PlatformRole::Admin | PlatformRole::Tenant)
    }
}

impl FromStr for PlatformRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(PlatformRole::Admin),
            "committee" => Ok(PlatformRole::Committee),
            "tenant" => Ok(PlatformRole::Tenant),
            _ => Err(format!("Invalid platform role: {}", s)),
        }
    }
}

impl fmt::Display for PlatformRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role held within a single building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Committee,
    Tenant,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Committee => "committee",
            MemberRole::Tenant => "tenant",
        }
    }

    /// Returns true if this role can manage the building (invites, documents).
    pub fn can_manage_building(&self) -> bool {
        matches!(self, MemberRole::Committee)
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "committee" => Ok(MemberRole::Committee),
            "tenant" => Ok(MemberRole::Tenant),
            _ => Err(format!("Invalid member role: {}", s)),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<MemberRole> for PlatformRole {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Committee => PlatformRole::Committee,
            MemberRole::Tenant => PlatformRole::Tenant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_role_round_trip_str() {
        for role in [PlatformRole::Admin, PlatformRole::Committee, PlatformRole::Tenant] {
            assert_eq!(role.as_str().parse::<PlatformRole>().unwrap(), role);
        }
        assert!("owner".parse::<PlatformRole>().is_err());
    }

    #[test]
    fn test_platform_role_parse_case_insensitive() {
        assert_eq!("ADMIN".parse::<PlatformRole>().unwrap(), PlatformRole::Admin);
    }

    #[test]
    fn test_directly_assignable_roles() {
        assert!(PlatformRole::Admin.is_directly_assignable());
        assert!(PlatformRole::Tenant.is_directly_assignable());
        assert!(!PlatformRole::Committee.is_directly_assignable());
    }

    #[test]
    fn test_member_role_maps_to_platform_role() {
        assert_eq!(PlatformRole::from(MemberRole::Committee), PlatformRole::Committee);
        assert_eq!(PlatformRole::from(MemberRole::Tenant), PlatformRole::Tenant);
    }

    #[test]
    fn test_member_role_serde() {
        let json = serde_json::to_string(&MemberRole::Committee).unwrap();
        assert_eq!(json, "\"committee\"");
        let role: MemberRole = serde_json::from_str("\"tenant\"").unwrap();
        assert_eq!(role, MemberRole::Tenant);
        assert!(serde_json::from_str::<MemberRole>("\"admin\"").is_err());
    }

    #[test]
    fn test_member_role_can_manage_building() {
        assert!(MemberRole::Committee.can_manage_building());
        assert!(!MemberRole::Tenant.can_manage_building());
    }
}
