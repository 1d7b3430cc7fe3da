//! Shared domain enums
//!
//! All of these are stored as TEXT columns and travel as lowercase strings in
//! JSON. Parsing is strict: an unknown string is an error, never a default.

use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres,
};
use utoipa::ToSchema;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:tt ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| format!("Invalid {}: {}", stringify!($name), s))
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let s = <&str as Decode<Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

text_enum! {
    /// Physical condition of an asset
    pub enum AssetCondition {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
        Damaged => "damaged",
    }
}

text_enum! {
    /// Lifecycle status of an asset
    pub enum AssetStatus {
        Available => "available",
        Issued => "issued",
        Maintenance => "maintenance",
        Retired => "retired",
    }
}

text_enum! {
    /// Persisted status of an issue. Overdue is derived, never stored.
    pub enum IssueStatus {
        Active => "active",
        Returned => "returned",
    }
}

text_enum! {
    /// Access tier of a profile
    pub enum Role {
        Admin => "admin",
        Technician => "technician",
        Staff => "staff",
    }
}

impl Role {
    /// Admins and technicians run the issue desk
    pub fn can_manage_issues(&self) -> bool {
        match self {
            Role::Admin | Role::Technician => true,
            Role::Staff => false,
        }
    }
}

text_enum! {
    pub enum MaintenanceType {
        Preventive => "preventive",
        Corrective => "corrective",
        Emergency => "emergency",
    }
}

text_enum! {
    /// Persisted maintenance status; "overdue" is derived for scheduled work
    pub enum MaintenanceStatus {
        Scheduled => "scheduled",
        InProgress => "in-progress",
        Completed => "completed",
    }
}

text_enum! {
    pub enum AuditSeverity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

text_enum! {
    pub enum RequestPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

text_enum! {
    pub enum RequestStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Fulfilled => "fulfilled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Available".parse::<AssetStatus>(), Ok(AssetStatus::Available));
        assert_eq!(" ADMIN ".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("in_progress".parse::<MaintenanceStatus>(), Ok(MaintenanceStatus::InProgress));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!("superuser".parse::<Role>().is_err());
        assert!("".parse::<AssetCondition>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&MaintenanceStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let status: AssetStatus = serde_json::from_str("\"retired\"").unwrap();
        assert_eq!(status, AssetStatus::Retired);
    }

    #[test]
    fn test_issue_desk_roles() {
        assert!(Role::Admin.can_manage_issues());
        assert!(Role::Technician.can_manage_issues());
        assert!(!Role::Staff.can_manage_issues());
    }
}
