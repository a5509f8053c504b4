use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Organizational role as reported by the API.
///
/// Role strings are normalized exactly once, when they are decoded, so the
/// rest of the crate never compares raw role text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    Ceo,
    Manager,
    TeamLead,
    Member,
    Unknown,
}

/// How far a role's visibility reaches through the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    SelfOnly,
    SelfAndSubordinates,
    Everyone,
}

const FALLBACK_DESCRIPTION: &str = "Limited access: your own assigned work only";

impl Role {
    /// Every recognized role, in descending order of visibility.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Ceo,
        Role::Manager,
        Role::TeamLead,
        Role::Member,
    ];

    /// Normalize a raw role string. Case, surrounding whitespace, hyphens and
    /// inner spaces are ignored. Unrecognized input maps to `Unknown`.
    pub fn normalize(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        match key.as_str() {
            "ADMIN" => Role::Admin,
            "CEO" => Role::Ceo,
            "MANAGER" => Role::Manager,
            "TEAM_LEAD" | "TEAMLEAD" => Role::TeamLead,
            "MEMBER" => Role::Member,
            _ => Role::Unknown,
        }
    }

    /// Canonical tag, e.g. `TEAM_LEAD`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Ceo => "CEO",
            Role::Manager => "MANAGER",
            Role::TeamLead => "TEAM_LEAD",
            Role::Member => "MEMBER",
            Role::Unknown => "UNKNOWN",
        }
    }

    /// Unknown roles get the narrowest scope.
    pub fn scope_kind(&self) -> ScopeKind {
        match self {
            Role::Admin | Role::Ceo => ScopeKind::Everyone,
            Role::Manager | Role::TeamLead => ScopeKind::SelfAndSubordinates,
            Role::Member | Role::Unknown => ScopeKind::SelfOnly,
        }
    }

    pub fn scope_description(&self) -> &'static str {
        match self {
            Role::Admin => "Full system access: all users, teams, projects and tasks",
            Role::Ceo => "Organization-wide view of every team, project and task",
            Role::Manager => "Your own work plus everyone in your reporting line",
            Role::TeamLead => "Your own work plus the work of the people who report to you",
            Role::Member => "Your own assigned tasks and projects",
            Role::Unknown => FALLBACK_DESCRIPTION,
        }
    }

    /// Metric labels a dashboard shows for this role.
    pub fn specific_metrics(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => &[
                "System Overview",
                "User Management",
                "All Projects",
                "All Teams",
                "Task Completion Rate",
                "Escalations",
            ],
            Role::Ceo => &[
                "Organization Performance",
                "Department Overview",
                "Project Portfolio",
                "Team Productivity",
                "Escalations",
            ],
            Role::Manager => &[
                "Reporting Line Performance",
                "Team Projects",
                "Task Completion Rate",
                "Overdue Tasks",
                "Escalations",
            ],
            Role::TeamLead => &[
                "Team Performance",
                "Team Tasks",
                "Member Workload",
                "Overdue Tasks",
            ],
            Role::Member => &["My Tasks", "My Projects", "My Completion Rate", "My Overdue Tasks"],
            Role::Unknown => &["My Tasks"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Role::normalize(s))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Role::Unknown, Role::normalize))
    }
}

/// Scope description for a raw role string.
pub fn role_scope_description(role: &str) -> &'static str {
    Role::normalize(role).scope_description()
}

/// Dashboard metric labels for a raw role string.
pub fn role_specific_metrics(role: &str) -> &'static [&'static str] {
    Role::normalize(role).specific_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_variants() {
        assert_eq!(Role::normalize("admin"), Role::Admin);
        assert_eq!(Role::normalize(" CEO "), Role::Ceo);
        assert_eq!(Role::normalize("Manager"), Role::Manager);
        assert_eq!(Role::normalize("team_lead"), Role::TeamLead);
        assert_eq!(Role::normalize("Team Lead"), Role::TeamLead);
        assert_eq!(Role::normalize("team-lead"), Role::TeamLead);
        assert_eq!(Role::normalize("TEAMLEAD"), Role::TeamLead);
        assert_eq!(Role::normalize("member"), Role::Member);
        assert_eq!(Role::normalize("intern"), Role::Unknown);
        assert_eq!(Role::normalize(""), Role::Unknown);
    }

    #[test]
    fn test_scope_kind_exhaustive() {
        assert_eq!(Role::Admin.scope_kind(), ScopeKind::Everyone);
        assert_eq!(Role::Ceo.scope_kind(), ScopeKind::Everyone);
        assert_eq!(Role::Manager.scope_kind(), ScopeKind::SelfAndSubordinates);
        assert_eq!(Role::TeamLead.scope_kind(), ScopeKind::SelfAndSubordinates);
        assert_eq!(Role::Member.scope_kind(), ScopeKind::SelfOnly);
        // Unrecognized roles fall back to the narrowest scope
        assert_eq!(Role::Unknown.scope_kind(), ScopeKind::SelfOnly);
    }

    #[test]
    fn test_scope_description_fallback() {
        assert_eq!(role_scope_description("wizard"), FALLBACK_DESCRIPTION);
        assert_ne!(role_scope_description("ceo"), FALLBACK_DESCRIPTION);
        for role in Role::ALL {
            assert!(!role.scope_description().is_empty());
        }
    }

    #[test]
    fn test_specific_metrics_non_empty() {
        for role in Role::ALL {
            assert!(!role.specific_metrics().is_empty(), "{role} has no metrics");
        }
        assert_eq!(role_specific_metrics("nobody"), &["My Tasks"]);
    }

    #[test]
    fn test_serde_roundtrip_normalizes() {
        let role: Role = serde_json::from_str("\"team lead\"").unwrap();
        assert_eq!(role, Role::TeamLead);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"TEAM_LEAD\"");
    }
}
