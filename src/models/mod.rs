//! Data models for the asset tracker

pub mod asset;
pub mod audit;
pub mod category;
pub mod dashboard;
pub mod department;
pub mod enums;
pub mod issue;
pub mod maintenance;
pub mod profile;
pub mod report;
pub mod request;

// Re-export commonly used types
pub use asset::{Asset, AssetShort};
pub use enums::{AssetCondition, AssetStatus, AuditSeverity, IssueStatus, Role};
pub use issue::{AssetIssue, IssueDetails, Overdue};
pub use profile::{Profile, ProfileShort, UserClaims};
