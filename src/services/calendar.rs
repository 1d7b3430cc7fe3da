//! Monthly calendar of issue, return and maintenance dates

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        issue::IssueDetails,
        maintenance::MaintenanceDetails,
        profile::UserClaims,
        report::{CalendarEvent, CalendarEventKind, CalendarQuery},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CalendarService {
    repository: Repository,
}

impl CalendarService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Events in the requested month. Staff only see their own issues.
    pub async fn month(
        &self,
        query: &CalendarQuery,
        claims: &UserClaims,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CalendarEvent>> {
        let (start, end) = query
            .bounds()
            .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", query.year, query.month)))?;

        let mut issues = self.repository.issues_in_range(start, end, now).await?;
        let maintenance = if claims.role.can_manage_issues() {
            self.repository.maintenance_in_range(start, end).await?
        } else {
            issues.retain(|i| i.issued_to.id == claims.sub);
            Vec::new()
        };

        Ok(build_events(&issues, &maintenance, start, end, now.date_naive()))
    }
}

/// Flatten issues and maintenance into date-ordered events within `[start, end)`
pub fn build_events(
    issues: &[IssueDetails],
    maintenance: &[MaintenanceDetails],
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Vec<CalendarEvent> {
    let in_month = |d: NaiveDate| d >= start && d < end;
    let mut events = Vec::new();

    for issue in issues {
        let issued_on = issue.issue_date.date_naive();
        if in_month(issued_on) {
            events.push(CalendarEvent {
                kind: CalendarEventKind::Issue,
                date: issued_on,
                title: format!("{} issued to {}", issue.asset.name, issue.issued_to.full_name),
                asset_id: issue.asset.id,
                asset_code: issue.asset.asset_code.clone(),
                reference_id: issue.id,
                overdue: false,
            });
        }

        let due_on = issue.expected_return_date.date_naive();
        if in_month(due_on) {
            events.push(CalendarEvent {
                kind: CalendarEventKind::ExpectedReturn,
                date: due_on,
                title: format!("{} due back from {}", issue.asset.name, issue.issued_to.full_name),
                asset_id: issue.asset.id,
                asset_code: issue.asset.asset_code.clone(),
                reference_id: issue.id,
                overdue: issue.is_overdue,
            });
        }
    }

    for record in maintenance {
        let date = record.record.scheduled_date;
        if in_month(date) {
            events.push(CalendarEvent {
                kind: CalendarEventKind::Maintenance,
                date,
                title: format!("{} maintenance: {}", record.record.maintenance_type, record.asset_name),
                asset_id: record.record.asset_id,
                asset_code: record.asset_code.clone(),
                reference_id: record.record.id,
                overdue: record.record.is_overdue(today),
            });
        }
    }

    events.sort_by(|a, b| a.date.cmp(&b.date));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        asset::AssetShort,
        enums::{AssetCondition, AssetStatus, IssueStatus, MaintenanceStatus, MaintenanceType},
        maintenance::MaintenanceRecord,
        profile::ProfileShort,
    };
    use chrono::TimeZone;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn issue(issued: u32, due_month: u32, due: u32, now: DateTime<Utc>) -> IssueDetails {
        IssueDetails {
            id: Uuid::new_v4(),
            status: IssueStatus::Active,
            issue_date: Utc.with_ymd_and_hms(2024, 6, issued, 9, 0, 0).unwrap(),
            expected_return_date: Utc.with_ymd_and_hms(2024, due_month, due, 0, 0, 0).unwrap(),
            actual_return_date: None,
            return_condition: None,
            notes: None,
            asset: AssetShort {
                id: Uuid::new_v4(),
                asset_code: "CUT-PROJ-001".into(),
                name: "Epson EB-X41".into(),
                category: "projector".into(),
                brand: None,
                model: None,
                location: None,
                status: AssetStatus::Issued,
                condition: AssetCondition::Good,
            },
            issued_to: ProfileShort {
                id: Uuid::new_v4(),
                full_name: "T. Moyo".into(),
                email: "t.moyo@cut.ac.zw".into(),
                department: None,
            },
            issued_by: None,
            is_overdue: false,
            days_overdue: 0,
        }
        .refresh_overdue(now)
    }

    #[test]
    fn test_events_are_clipped_to_the_month_and_sorted() {
        let now = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();
        let issues = vec![issue(12, 6, 15, now), issue(3, 7, 2, now)];
        let now_date = now.date_naive();
        let record = MaintenanceRecord {
            id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            maintenance_type: MaintenanceType::Preventive,
            description: "Filter clean".into(),
            scheduled_date: date(10),
            completed_date: None,
            technician: None,
            cost: None,
            notes: None,
            status: MaintenanceStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        let maintenance = vec![MaintenanceDetails {
            record,
            asset_code: "CUT-LAP-007".into(),
            asset_name: "ThinkPad".into(),
            asset_category: "laptop".into(),
            is_overdue: false,
        }];

        let events = build_events(&issues, &maintenance, date(1), date(30) + chrono::Duration::days(1), now_date);
        let kinds: Vec<_> = events.iter().map(|e| (e.kind, e.date)).collect();
        assert_eq!(
            kinds,
            vec![
                (CalendarEventKind::Issue, date(3)),
                (CalendarEventKind::Maintenance, date(10)),
                (CalendarEventKind::Issue, date(12)),
                (CalendarEventKind::ExpectedReturn, date(15)),
            ]
        );
        // Due on the 15th, looked at on the 20th
        assert!(events[3].overdue);
        assert!(events[1].overdue);
        assert!(!events[0].overdue);
    }
}
