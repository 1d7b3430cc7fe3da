//! Asset registry service

use std::future::Future;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{InstitutionConfig, QrConfig},
    error::{AppError, AppResult},
    models::{
        asset::{
            is_valid_asset_code, normalize_asset_code, Asset, AssetHistory, AssetPage, AssetQuery,
            AvailabilityCheck, CreateAsset, GeneratedCode, UpdateAsset,
        },
        audit::{ClientInfo, NewAuditEntry},
        enums::{AssetStatus, AuditSeverity},
        profile::UserClaims,
    },
    repository::Repository,
    services::audit::AuditService,
};

/// Random codes tried before giving up
pub const MAX_CODE_ATTEMPTS: u32 = 10;

const FALLBACK_CATEGORY_PREFIX: &str = "ASSET";

/// Fixed code segments for the common categories
pub fn category_prefix(category: &str) -> Option<&'static str> {
    match category.trim().to_lowercase().as_str() {
        "projector" => Some("PROJ"),
        "laptop" => Some("LAP"),
        "desktop" => Some("DESK"),
        "printer" => Some("PRINT"),
        "camera" => Some("CAM"),
        "other" => Some("OTHER"),
        _ => None,
    }
}

/// `{INSTITUTION}-{CATEGORY}-{NNN}`
pub fn format_asset_code(institution: &str, category_prefix: &str, number: u16) -> String {
    format!(
        "{}-{}-{:03}",
        institution.trim().to_uppercase(),
        category_prefix.trim().to_uppercase(),
        number % 1000
    )
}

/// Third-party QR image URL for a code
pub fn qr_code_url(config: &QrConfig, code: &str) -> String {
    format!(
        "{}?size={size}x{size}&data={}",
        config.base_url,
        urlencoding::encode(code),
        size = config.size
    )
}

/// Draw candidates until one is not taken, at most `max_attempts` times.
/// Returns the code and the number of attempts used.
pub(crate) async fn pick_unused_code<N, T, Fut>(
    mut next_candidate: N,
    mut is_taken: T,
    max_attempts: u32,
) -> AppResult<(String, u32)>
where
    N: FnMut() -> String,
    T: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    for attempt in 1..=max_attempts {
        let candidate = next_candidate();
        if !is_taken(candidate.clone()).await? {
            return Ok((candidate, attempt));
        }
    }
    Err(AppError::BusinessRule(
        "Unable to generate unique asset code".to_string(),
    ))
}

/// Empty optional text is treated as absent
fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct AssetsService {
    repository: Repository,
    audit: AuditService,
    institution: InstitutionConfig,
    qr: QrConfig,
}

impl AssetsService {
    pub fn new(repository: Repository, audit: AuditService, institution: InstitutionConfig, qr: QrConfig) -> Self {
        Self {
            repository,
            audit,
            institution,
            qr,
        }
    }

    pub fn qr_code_url(&self, code: &str) -> String {
        qr_code_url(&self.qr, code)
    }

    /// Propose an unused code for a category
    pub async fn generate_code(&self, category: &str) -> AppResult<GeneratedCode> {
        let prefix = match category_prefix(category) {
            Some(prefix) => prefix.to_string(),
            None => self
                .repository
                .categories_find_by_name(category)
                .await?
                .map(|c| c.code)
                .unwrap_or_else(|| FALLBACK_CATEGORY_PREFIX.to_string()),
        };
        let institution = self.institution.asset_code_prefix.clone();

        let (asset_code, attempts) = pick_unused_code(
            || format_asset_code(&institution, &prefix, rand::thread_rng().gen_range(0..1000)),
            |code| {
                let repository = self.repository.clone();
                async move { repository.assets_code_exists(&code).await }
            },
            MAX_CODE_ATTEMPTS,
        )
        .await?;

        Ok(GeneratedCode {
            qr_code_url: self.qr_code_url(&asset_code),
            asset_code,
            attempts,
        })
    }

    /// Advisory check used by forms; registration re-checks atomically
    pub async fn check_code(&self, code: &str) -> AppResult<AvailabilityCheck> {
        let code = normalize_asset_code(code);
        let taken = self.repository.assets_code_exists(&code).await?;
        Ok(AvailabilityCheck {
            message: taken.then(|| "Asset code already exists".to_string()),
            available: !taken,
            value: code,
        })
    }

    /// Advisory serial number check, optionally ignoring one asset
    pub async fn check_serial(&self, serial: &str, exclude_id: Option<Uuid>) -> AppResult<AvailabilityCheck> {
        let serial = serial.trim().to_string();
        let taken = self.repository.assets_serial_exists(&serial, exclude_id).await?;
        Ok(AvailabilityCheck {
            message: taken.then(|| "Serial number already exists".to_string()),
            available: !taken,
            value: serial,
        })
    }

    /// Register a new asset
    pub async fn register(&self, mut data: CreateAsset, claims: &UserClaims, client: &ClientInfo) -> AppResult<Asset> {
        data.validate()?;

        data.asset_code = normalize_asset_code(&data.asset_code);
        if !is_valid_asset_code(&data.asset_code) {
            return Err(AppError::Validation(format!(
                "Invalid asset code: {}",
                data.asset_code
            )));
        }
        data.serial_number = blank_to_none(&data.serial_number);

        if self.repository.assets_code_exists(&data.asset_code).await? {
            return Err(AppError::duplicate("asset_code", "Asset code already exists"));
        }
        if let Some(ref serial) = data.serial_number {
            if self.repository.assets_serial_exists(serial, None).await? {
                return Err(AppError::duplicate("serial_number", "Serial number already exists"));
            }
        }

        let qr = self.qr_code_url(&data.asset_code);
        let asset = self.repository.assets_create(&data, &qr, claims.sub).await?;

        tracing::info!(asset_id = %asset.id, asset_code = %asset.asset_code, "Asset registered");
        self.audit
            .record(
                NewAuditEntry::new("asset.register", "asset", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&asset.asset_code)
                    .details(json!({ "name": asset.name, "category": asset.category }))
                    .client(client),
            )
            .await;

        Ok(asset)
    }

    pub async fn list(&self, query: &AssetQuery) -> AppResult<AssetPage> {
        let (items, total, page, per_page) = self.repository.assets_search(query).await?;
        Ok(AssetPage {
            items,
            total,
            page,
            per_page,
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Asset> {
        self.repository.assets_get_by_id(id).await
    }

    /// Exact lookup by code, ignoring case and surrounding whitespace
    pub async fn get_by_code(&self, code: &str) -> AppResult<Asset> {
        let code = normalize_asset_code(code);
        self.repository
            .assets_find_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", code)))
    }

    pub async fn update(&self, id: Uuid, mut data: UpdateAsset, claims: &UserClaims, client: &ClientInfo) -> AppResult<Asset> {
        data.validate()?;

        if data.serial_number.is_some() {
            data.serial_number = blank_to_none(&data.serial_number);
        }
        if let Some(ref serial) = data.serial_number {
            if self.repository.assets_serial_exists(serial, Some(id)).await? {
                return Err(AppError::duplicate("serial_number", "Serial number already exists"));
            }
        }

        let asset = self.repository.assets_update(id, &data).await?;
        self.audit
            .record(
                NewAuditEntry::new("asset.update", "asset", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&asset.asset_code)
                    .client(client),
            )
            .await;
        Ok(asset)
    }

    /// Manual status change. `issued` is only reachable through the issue workflow.
    pub async fn set_status(&self, id: Uuid, status: AssetStatus, claims: &UserClaims, client: &ClientInfo) -> AppResult<Asset> {
        if status == AssetStatus::Issued {
            return Err(AppError::BusinessRule(
                "Assets are issued through the issue workflow".to_string(),
            ));
        }

        let asset = self.repository.assets_set_status(id, status).await?;
        let severity = match status {
            AssetStatus::Retired => AuditSeverity::Medium,
            _ => AuditSeverity::Low,
        };
        self.audit
            .record(
                NewAuditEntry::new("asset.status", "asset", severity)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&asset.asset_code)
                    .details(json!({ "status": status }))
                    .client(client),
            )
            .await;
        Ok(asset)
    }

    /// Issues and maintenance for one asset
    pub async fn history(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<AssetHistory> {
        let asset = self.repository.assets_get_by_id(id).await?;
        let issues = self.repository.issues_for_asset(id, now).await?;
        let maintenance = self.repository.maintenance_for_asset(id).await?;
        Ok(AssetHistory {
            asset,
            issues,
            maintenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    #[test]
    fn test_category_prefixes() {
        assert_eq!(category_prefix("projector"), Some("PROJ"));
        assert_eq!(category_prefix(" Laptop "), Some("LAP"));
        assert_eq!(category_prefix("desktop"), Some("DESK"));
        assert_eq!(category_prefix("printer"), Some("PRINT"));
        assert_eq!(category_prefix("camera"), Some("CAM"));
        assert_eq!(category_prefix("other"), Some("OTHER"));
        assert_eq!(category_prefix("tablet"), None);
    }

    #[test]
    fn test_code_format() {
        assert_eq!(format_asset_code("cut", "PROJ", 1), "CUT-PROJ-001");
        assert_eq!(format_asset_code("CUT", "lap", 42), "CUT-LAP-042");
        assert_eq!(format_asset_code("CUT", "CAM", 999), "CUT-CAM-999");
        assert!(is_valid_asset_code(&format_asset_code("CUT", "ASSET", 7)));
    }

    #[test]
    fn test_qr_url_encodes_code() {
        let config = QrConfig {
            base_url: "https://api.qrserver.com/v1/create-qr-code/".into(),
            size: 200,
        };
        assert_eq!(
            qr_code_url(&config, "CUT-PROJ-001"),
            "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=CUT-PROJ-001"
        );
        assert!(qr_code_url(&config, "A B&C").ends_with("data=A%20B%26C"));
    }

    #[tokio::test]
    async fn test_pick_unused_code_skips_taken() {
        let mut n = 0u16;
        let (code, attempts) = pick_unused_code(
            || {
                n += 1;
                format_asset_code("CUT", "PROJ", n)
            },
            |code| async move { Ok(code != "CUT-PROJ-003") },
            MAX_CODE_ATTEMPTS,
        )
        .await
        .unwrap();
        assert_eq!(code, "CUT-PROJ-003");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_pick_unused_code_gives_up_after_ten_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let err = pick_unused_code(
            || "CUT-PROJ-001".to_string(),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(true) }
            },
            MAX_CODE_ATTEMPTS,
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 10);
        match err {
            AppError::BusinessRule(msg) => assert_eq!(msg, "Unable to generate unique asset code"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_issued_status_cannot_be_set_by_hand() {
        let repository = Repository::offline();
        let service = AssetsService::new(
            repository.clone(),
            AuditService::new(repository),
            InstitutionConfig::default(),
            QrConfig::default(),
        );
        let now = chrono::Utc::now().timestamp();
        let claims = UserClaims {
            sub: Uuid::new_v4(),
            sid: "s".into(),
            email: "admin@cut.ac.zw".into(),
            role: crate::models::enums::Role::Admin,
            exp: now + 60,
            iat: now,
        };

        let result = service
            .set_status(Uuid::new_v4(), AssetStatus::Issued, &claims, &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AppError::BusinessRule(_))));
    }

    #[test]
    fn test_blank_serial_is_absent() {
        assert_eq!(blank_to_none(&Some("  ".into())), None);
        assert_eq!(blank_to_none(&Some(" SN1 ".into())), Some("SN1".to_string()));
        assert_eq!(blank_to_none(&None), None);
    }
}
