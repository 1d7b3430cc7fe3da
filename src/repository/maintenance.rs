//! Maintenance domain methods on Repository

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{Filters, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AssetStatus, MaintenanceStatus},
        maintenance::{
            CompleteMaintenance, CreateMaintenance, MaintenanceDetails, MaintenanceFilter,
            MaintenanceQuery, MaintenanceRecord, MaintenanceSummary,
        },
    },
};

const MAINTENANCE_DETAILS_SELECT: &str = r#"
    SELECT m.*, a.asset_code, a.name AS asset_name, a.category AS asset_category
    FROM maintenance_records m
    JOIN assets a ON a.id = m.asset_id
"#;

impl Repository {
    /// Get maintenance record by ID
    pub async fn maintenance_get_by_id(&self, id: Uuid) -> AppResult<MaintenanceRecord> {
        sqlx::query_as::<_, MaintenanceRecord>("SELECT * FROM maintenance_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Maintenance record {} not found", id)))
    }

    /// List maintenance records, soonest first
    pub async fn maintenance_search(
        &self,
        query: &MaintenanceQuery,
        today: NaiveDate,
    ) -> AppResult<Vec<MaintenanceDetails>> {
        let mut filters = Filters::default();
        match query.status {
            Some(MaintenanceFilter::Scheduled) => filters.eq("m.status", MaintenanceStatus::Scheduled),
            Some(MaintenanceFilter::InProgress) => filters.eq("m.status", MaintenanceStatus::InProgress),
            Some(MaintenanceFilter::Completed) => filters.eq("m.status", MaintenanceStatus::Completed),
            Some(MaintenanceFilter::Overdue) => {
                let p = filters.param(today);
                filters.raw(format!("m.status = 'scheduled' AND m.scheduled_date < {}::date", p));
            }
            None => {}
        }
        if let Some(ref search) = query.search {
            filters.search(&["a.name", "a.asset_code", "m.description"], search);
        }

        let sql = format!(
            "{} WHERE {} ORDER BY m.scheduled_date",
            MAINTENANCE_DETAILS_SELECT,
            filters.where_clause()
        );
        let rows = filters
            .bind_as(sqlx::query_as::<_, MaintenanceDetails>(&sql))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|mut d| {
                d.is_overdue = d.record.is_overdue(today);
                d
            })
            .collect())
    }

    /// Maintenance history of an asset
    pub async fn maintenance_for_asset(&self, asset_id: Uuid) -> AppResult<Vec<MaintenanceRecord>> {
        let rows = sqlx::query_as::<_, MaintenanceRecord>(
            "SELECT * FROM maintenance_records WHERE asset_id = $1 ORDER BY scheduled_date DESC",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Maintenance scheduled within `[start, end)`
    pub async fn maintenance_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<MaintenanceDetails>> {
        let sql = format!(
            "{} WHERE m.scheduled_date >= $1 AND m.scheduled_date < $2 ORDER BY m.scheduled_date",
            MAINTENANCE_DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, MaintenanceDetails>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Schedule maintenance
    pub async fn maintenance_create(&self, data: &CreateMaintenance) -> AppResult<MaintenanceRecord> {
        // Surface a missing asset as 404 rather than a foreign key error
        self.assets_get_by_id(data.asset_id).await?;

        let row = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            INSERT INTO maintenance_records (
                asset_id, maintenance_type, description, scheduled_date,
                technician, cost, notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.asset_id)
        .bind(data.maintenance_type)
        .bind(data.description.trim())
        .bind(data.scheduled_date)
        .bind(&data.technician)
        .bind(data.cost)
        .bind(&data.notes)
        .bind(MaintenanceStatus::Scheduled)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Start scheduled work: record goes in-progress, asset goes to maintenance
    pub async fn maintenance_start(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<MaintenanceRecord> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, MaintenanceRecord>(
            "SELECT * FROM maintenance_records WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance record {} not found", id)))?;

        if record.status != MaintenanceStatus::Scheduled {
            return Err(AppError::BusinessRule(format!(
                "Maintenance {} is {} and cannot be started",
                id, record.status
            )));
        }

        let (asset_status, asset_code) = sqlx::query_as::<_, (AssetStatus, String)>(
            "SELECT status, asset_code FROM assets WHERE id = $1 FOR UPDATE",
        )
        .bind(record.asset_id)
        .fetch_one(&mut *tx)
        .await?;

        match asset_status {
            AssetStatus::Available | AssetStatus::Maintenance => {}
            AssetStatus::Issued | AssetStatus::Retired => {
                return Err(AppError::BusinessRule(format!(
                    "Asset {} is not available ({})",
                    asset_code, asset_status
                )));
            }
        }

        let started = sqlx::query_as::<_, MaintenanceRecord>(
            "UPDATE maintenance_records SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(MaintenanceStatus::InProgress)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE assets SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(record.asset_id)
            .bind(AssetStatus::Maintenance)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(started)
    }

    /// Complete work and release the asset if maintenance was holding it
    pub async fn maintenance_complete(
        &self,
        id: Uuid,
        data: &CompleteMaintenance,
        now: DateTime<Utc>,
    ) -> AppResult<MaintenanceRecord> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, MaintenanceRecord>(
            "SELECT * FROM maintenance_records WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance record {} not found", id)))?;

        if record.status == MaintenanceStatus::Completed {
            return Err(AppError::BusinessRule(format!(
                "Maintenance {} is already completed",
                id
            )));
        }

        let completed_date = data.completed_date.unwrap_or_else(|| now.date_naive());

        let completed = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            UPDATE maintenance_records
            SET status = $2, completed_date = $3, cost = COALESCE($4, cost),
                notes = COALESCE($5, notes), updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(MaintenanceStatus::Completed)
        .bind(completed_date)
        .bind(data.cost)
        .bind(&data.notes)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE assets SET status = 'available', updated_at = $2 WHERE id = $1 AND status = 'maintenance'",
        )
        .bind(record.asset_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(completed)
    }

    /// Counts per status, with scheduled work past its date counted as overdue
    pub async fn maintenance_summary(&self, today: NaiveDate) -> AppResult<MaintenanceSummary> {
        let (total, scheduled, in_progress, completed, overdue) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'scheduled'),
                       COUNT(*) FILTER (WHERE status = 'in-progress'),
                       COUNT(*) FILTER (WHERE status = 'completed'),
                       COUNT(*) FILTER (WHERE status = 'scheduled' AND scheduled_date < $1)
                FROM maintenance_records
                "#,
            )
            .bind(today)
            .fetch_one(&self.pool)
            .await?;

        Ok(MaintenanceSummary {
            total,
            scheduled,
            in_progress,
            completed,
            overdue,
        })
    }
}
