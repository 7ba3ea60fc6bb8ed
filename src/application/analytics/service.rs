//! Analytics service
//!
//! Loads the records for a scope and hands them to the pure aggregation
//! functions. Callers pass `now` so windows are reproducible.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::comparison::{compare, ComparisonPreset, ComparisonWindows, UsageComparison};
use super::efficiency::{build_report, EfficiencyReport};
use super::statistics::{daily_series, summarize, DailyStats, EnergySummary};
use crate::domain::{
    Device, DomainError, DomainResult, EnergyData, EnergyQuery, RepositoryProvider, TimeWindow,
    User,
};
use crate::shared::Page;

pub const MAX_WINDOW_DAYS: u32 = 365;

/// How the two comparison windows are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonSpec {
    Preset(ComparisonPreset),
    /// Last `current_days` against the `baseline_days` before them.
    Days { current_days: u32, baseline_days: u32 },
}

impl ComparisonSpec {
    pub fn resolve(&self, now: DateTime<Utc>) -> ComparisonWindows {
        match *self {
            ComparisonSpec::Preset(preset) => preset.resolve(now),
            ComparisonSpec::Days {
                current_days,
                baseline_days,
            } => ComparisonWindows::rolling(now, current_days, baseline_days),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStatsReport {
    pub window: TimeWindow,
    pub days: Vec<DailyStats>,
    pub total_consumption_kwh: f64,
    pub total_cost: f64,
}

/// A user with everything recommendation prompts need.
#[derive(Debug, Clone)]
pub struct UserSnapshot {
    pub user: User,
    pub devices: Vec<Device>,
    pub window: TimeWindow,
    pub records: Vec<EnergyData>,
    pub summary: EnergySummary,
}

#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub device: Device,
    pub owner: User,
    pub window: TimeWindow,
    pub records: Vec<EnergyData>,
    pub summary: EnergySummary,
}

pub struct AnalyticsService {
    repos: Arc<dyn RepositoryProvider>,
    default_window_days: u32,
}

fn check_days(days: u32) -> DomainResult<()> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(DomainError::Validation(format!(
            "days must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }
    Ok(())
}

impl AnalyticsService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, default_window_days: u32) -> Self {
        Self {
            repos,
            default_window_days: default_window_days.clamp(1, MAX_WINDOW_DAYS),
        }
    }

    pub fn default_window_days(&self) -> u32 {
        self.default_window_days
    }

    pub async fn user(&self, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn device(&self, id: &str) -> DomainResult<Device> {
        self.repos
            .devices()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Device", id))
    }

    async fn records(&self, query: EnergyQuery) -> DomainResult<Vec<EnergyData>> {
        let records = self.repos.energy_data().find(query).await?;
        debug!(count = records.len(), "Loaded energy records");
        Ok(records)
    }

    pub async fn user_summary(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DomainResult<EnergySummary> {
        let window = TimeWindow::from_bounds(start, end, now, self.default_window_days)?;
        self.user(user_id).await?;
        let records = self.records(EnergyQuery::for_user(user_id).within(window)).await?;
        Ok(summarize(&records, Some(&window)))
    }

    pub async fn device_summary(
        &self,
        device_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DomainResult<EnergySummary> {
        let window = TimeWindow::from_bounds(start, end, now, self.default_window_days)?;
        self.device(device_id).await?;
        let records = self
            .records(EnergyQuery::for_device(device_id).within(window))
            .await?;
        Ok(summarize(&records, Some(&window)))
    }

    /// `days` calendar days ending today (UTC), zero-filled.
    pub async fn daily_stats(
        &self,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<DailyStatsReport> {
        check_days(days)?;
        self.user(user_id).await?;

        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let window = TimeWindow::new(today - Duration::days(i64::from(days) - 1), now)?;
        let records = self.records(EnergyQuery::for_user(user_id).within(window)).await?;
        let summary = summarize(&records, Some(&window));

        Ok(DailyStatsReport {
            window,
            days: daily_series(&records, &window),
            total_consumption_kwh: summary.total_consumption_kwh,
            total_cost: summary.total_cost,
        })
    }

    pub async fn compare_usage(
        &self,
        user_id: &str,
        spec: ComparisonSpec,
        now: DateTime<Utc>,
    ) -> DomainResult<UsageComparison> {
        if let ComparisonSpec::Days {
            current_days,
            baseline_days,
        } = spec
        {
            check_days(current_days)?;
            check_days(baseline_days)?;
        }
        self.user(user_id).await?;

        let windows = spec.resolve(now);
        let records = self
            .records(EnergyQuery::for_user(user_id).within(windows.span()))
            .await?;
        Ok(compare(&records, windows))
    }

    pub async fn efficiency_report(
        &self,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<(User, EfficiencyReport)> {
        let snapshot = self.user_snapshot(user_id, days, now).await?;
        let report = build_report(
            &snapshot.devices,
            &snapshot.records,
            &snapshot.window,
            snapshot.user.goal(),
        );
        Ok((snapshot.user, report))
    }

    pub async fn user_snapshot(
        &self,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<UserSnapshot> {
        check_days(days)?;
        let user = self.user(user_id).await?;
        let devices = self
            .repos
            .devices()
            .find_by_user(user_id, Page::new(None, Some(Page::MAX_LIMIT)))
            .await?;

        let window = TimeWindow::last_days(now, days);
        let records = self.records(EnergyQuery::for_user(user_id).within(window)).await?;
        let summary = summarize(&records, Some(&window));

        Ok(UserSnapshot {
            user,
            devices,
            window,
            records,
            summary,
        })
    }

    pub async fn device_snapshot(
        &self,
        device_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<DeviceSnapshot> {
        check_days(days)?;
        let device = self.device(device_id).await?;
        let owner = self.user(&device.user_id).await?;

        let window = TimeWindow::last_days(now, days);
        let records = self
            .records(EnergyQuery::for_device(device_id).within(window))
            .await?;
        let summary = summarize(&records, Some(&window));

        Ok(DeviceSnapshot {
            device,
            owner,
            window,
            records,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeviceType, Measurement, Pricing};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    async fn seeded() -> (AnalyticsService, User, Device) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let user = repos
            .users()
            .save(User::new("s@example.com", "sam"))
            .await
            .unwrap();
        let device = repos
            .devices()
            .save(Device::new(&user.id, "AC", DeviceType::Hvac))
            .await
            .unwrap();

        let pricing = Pricing::new(0.2, "USD");
        // Two readings a day for the 14 days before `now`.
        for day in 1..=14 {
            for offset in [0, 6] {
                let ts = now() - Duration::days(day) + Duration::hours(offset);
                let r = EnergyData::record(&device, ts, Measurement::consumption(1.0), &pricing);
                repos.energy_data().save(r).await.unwrap();
            }
        }
        (AnalyticsService::new(repos, 30), user, device)
    }

    #[tokio::test]
    async fn user_summary_defaults_to_trailing_window() {
        let (svc, user, _) = seeded().await;
        let s = svc.user_summary(&user.id, None, None, now()).await.unwrap();
        assert_eq!(s.record_count, 28);
        assert_eq!(s.total_consumption_kwh, 28.0);
        assert_eq!(s.total_cost, 5.6);
    }

    #[tokio::test]
    async fn inverted_range_fails_before_lookup() {
        let (svc, _, _) = seeded().await;
        let err = svc
            .user_summary("nobody", Some(now()), Some(now() - Duration::days(1)), now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (svc, _, _) = seeded().await;
        let err = svc.user_summary("nobody", None, None, now()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn daily_stats_cover_requested_days() {
        let (svc, user, _) = seeded().await;
        let report = svc.daily_stats(&user.id, 7, now()).await.unwrap();
        assert_eq!(report.days.len(), 7);
        // Today has no readings yet.
        assert_eq!(report.days.last().map(|d| d.record_count), Some(0));
        assert_eq!(report.days[0].consumption_kwh, 2.0);
        assert_eq!(report.total_consumption_kwh, 12.0);
    }

    #[tokio::test]
    async fn daily_stats_reject_zero_days() {
        let (svc, user, _) = seeded().await;
        let err = svc.daily_stats(&user.id, 0, now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn steady_usage_compares_flat() {
        let (svc, user, _) = seeded().await;
        let spec = ComparisonSpec::Days {
            current_days: 7,
            baseline_days: 7,
        };
        let cmp = svc.compare_usage(&user.id, spec, now()).await.unwrap();
        assert_eq!(cmp.current.total_consumption_kwh, 14.0);
        assert_eq!(cmp.baseline.total_consumption_kwh, 14.0);
        assert_eq!(cmp.deltas.consumption.percent_change, Some(0.0));
    }

    #[tokio::test]
    async fn device_snapshot_includes_owner() {
        let (svc, user, device) = seeded().await;
        let snap = svc.device_snapshot(&device.id, 3, now()).await.unwrap();
        assert_eq!(snap.owner.id, user.id);
        assert_eq!(snap.summary.record_count, 6);
    }
}
