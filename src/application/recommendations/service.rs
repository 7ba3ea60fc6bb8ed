//! Recommendation service
//!
//! Gathers the statistics for a request, builds the prompt and the matching
//! rule-based fallback, and lets the client decide which one answers.
//! Lookup and validation errors propagate; generator failures never do.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::{RecommendationClient, RecommendationOutcome};
use super::{fallback, prompt};
use crate::application::analytics::{
    AnalyticsService, ComparisonSpec, EfficiencyReport, EnergySummary, Trend, UsageComparison,
};
use crate::domain::{Device, DomainError, DomainResult, TimeWindow};

/// Length of an energy-analysis window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPeriod {
    #[default]
    Week,
    Month,
    Quarter,
}

impl AnalysisPeriod {
    pub fn days(&self) -> u32 {
        match self {
            AnalysisPeriod::Week => 7,
            AnalysisPeriod::Month => 30,
            AnalysisPeriod::Quarter => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisPeriod::Week => "week",
            AnalysisPeriod::Month => "month",
            AnalysisPeriod::Quarter => "quarter",
        }
    }
}

impl std::str::FromStr for AnalysisPeriod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(AnalysisPeriod::Week),
            "month" => Ok(AnalysisPeriod::Month),
            "quarter" => Ok(AnalysisPeriod::Quarter),
            other => Err(DomainError::Validation(format!(
                "time_period must be one of week, month, quarter (got '{}')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRecommendations {
    pub user_id: String,
    pub window: TimeWindow,
    pub summary: EnergySummary,
    pub device_count: usize,
    pub outcome: RecommendationOutcome,
}

#[derive(Debug, Clone)]
pub struct DeviceTips {
    pub device: Device,
    pub window: TimeWindow,
    pub summary: EnergySummary,
    pub outcome: RecommendationOutcome,
}

#[derive(Debug, Clone)]
pub struct ComparisonInsights {
    pub user_id: String,
    pub comparison: UsageComparison,
    pub trend: Trend,
    pub outcome: RecommendationOutcome,
}

#[derive(Debug, Clone)]
pub struct EnergyAnalysis {
    pub user_id: String,
    pub period: AnalysisPeriod,
    pub window: TimeWindow,
    pub summary: EnergySummary,
    pub outcome: RecommendationOutcome,
}

#[derive(Debug, Clone)]
pub struct EfficiencyAnalysis {
    pub user_id: String,
    pub report: EfficiencyReport,
    pub outcome: RecommendationOutcome,
}

/// Generator availability as reported by the status endpoint.
#[derive(Debug, Clone)]
pub struct RecommendationStatus {
    pub configured: bool,
    pub model: String,
    pub timeout_secs: u64,
    pub cache_enabled: bool,
    pub mode: &'static str,
}

pub struct RecommendationService {
    analytics: Arc<AnalyticsService>,
    client: Arc<RecommendationClient>,
}

impl RecommendationService {
    pub fn new(analytics: Arc<AnalyticsService>, client: Arc<RecommendationClient>) -> Self {
        Self { analytics, client }
    }

    pub async fn general_recommendations(
        &self,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<UserRecommendations> {
        let snap = self.analytics.user_snapshot(user_id, days, now).await?;
        let prompt = prompt::recommendations(
            &snap.user,
            &snap.summary,
            snap.window.days(),
            &snap.devices,
            &snap.records,
        );
        let outcome = self
            .client
            .recommend(&format!("user:{}", user_id), &prompt, || {
                fallback::general_recommendations(&snap)
            })
            .await;

        Ok(UserRecommendations {
            user_id: snap.user.id,
            window: snap.window,
            device_count: snap.devices.len(),
            summary: snap.summary,
            outcome,
        })
    }

    pub async fn device_tips(
        &self,
        device_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<DeviceTips> {
        let snap = self.analytics.device_snapshot(device_id, days, now).await?;
        let prompt = prompt::device_optimization(
            &snap.device,
            &snap.owner,
            &snap.summary,
            snap.window.days(),
            &snap.records,
        );
        let outcome = self
            .client
            .recommend(&format!("device:{}", device_id), &prompt, || {
                fallback::device_tips(&snap)
            })
            .await;

        Ok(DeviceTips {
            device: snap.device,
            window: snap.window,
            summary: snap.summary,
            outcome,
        })
    }

    pub async fn usage_comparison(
        &self,
        user_id: &str,
        spec: ComparisonSpec,
        now: DateTime<Utc>,
    ) -> DomainResult<ComparisonInsights> {
        let comparison = self.analytics.compare_usage(user_id, spec, now).await?;
        let user = self.analytics.user(user_id).await?;
        let prompt = prompt::usage_comparison(&user, &comparison);
        let outcome = self
            .client
            .recommend(&format!("user:{}", user_id), &prompt, || {
                fallback::comparison_insights(&comparison)
            })
            .await;

        Ok(ComparisonInsights {
            user_id: user.id,
            trend: comparison.trend(),
            comparison,
            outcome,
        })
    }

    pub async fn energy_analysis(
        &self,
        user_id: &str,
        period: AnalysisPeriod,
        now: DateTime<Utc>,
    ) -> DomainResult<EnergyAnalysis> {
        let snap = self.analytics.user_snapshot(user_id, period.days(), now).await?;
        let prompt = prompt::pattern_analysis(&snap.user, &snap.summary, period.as_str());
        let outcome = self
            .client
            .recommend(&format!("user:{}", user_id), &prompt, || {
                fallback::pattern_insights(&snap.summary)
            })
            .await;

        Ok(EnergyAnalysis {
            user_id: snap.user.id,
            period,
            window: snap.window,
            summary: snap.summary,
            outcome,
        })
    }

    pub async fn efficiency_report(
        &self,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<EfficiencyAnalysis> {
        let (user, report) = self.analytics.efficiency_report(user_id, days, now).await?;
        let prompt = prompt::efficiency_report(&user, &report);
        let outcome = self
            .client
            .recommend(&format!("user:{}", user_id), &prompt, || {
                fallback::efficiency_recommendations(&report)
            })
            .await;

        Ok(EfficiencyAnalysis {
            user_id: user.id,
            report,
            outcome,
        })
    }

    pub fn status(&self) -> RecommendationStatus {
        let configured = self.client.is_configured();
        RecommendationStatus {
            configured,
            model: self.client.model().to_string(),
            timeout_secs: self.client.timeout().as_secs(),
            cache_enabled: self.client.cache_enabled(),
            mode: if configured { "ai" } else { "fallback" },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analytics::ComparisonPreset;
    use crate::application::recommendations::client::{ClientSettings, RecommendationSource};
    use crate::application::recommendations::generator::{ServiceUnavailable, TextGenerator};
    use crate::application::recommendations::prompt::{Prompt, PromptKind};
    use crate::domain::{DeviceType, EnergyData, Measurement, Pricing, RepositoryProvider, User};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    /// Records the prompt kinds it was asked for and always answers the same.
    struct Echo {
        seen: Mutex<Vec<PromptKind>>,
    }

    #[async_trait]
    impl TextGenerator for Echo {
        fn is_configured(&self) -> bool {
            true
        }

        async fn generate(&self, prompt: &Prompt, _: &str) -> Result<String, ServiceUnavailable> {
            self.seen.lock().unwrap().push(prompt.kind);
            Ok(format!("1. Advice for {}", prompt.kind.as_str()))
        }
    }

    struct Down;

    #[async_trait]
    impl TextGenerator for Down {
        fn is_configured(&self) -> bool {
            true
        }

        async fn generate(&self, _: &Prompt, _: &str) -> Result<String, ServiceUnavailable> {
            Err(ServiceUnavailable::Network("connection refused".into()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    async fn service(generator: Arc<dyn TextGenerator>) -> (RecommendationService, User, Device) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut user = User::new("r@example.com", "robin");
        user.energy_goal_kwh = Some(30.0);
        let user = repos.users().save(user).await.unwrap();
        let device = repos
            .devices()
            .save(Device::new(&user.id, "Heat pump", DeviceType::Hvac))
            .await
            .unwrap();
        let pricing = Pricing::default();
        for day in 1..=10 {
            let r = EnergyData::record(
                &device,
                now() - Duration::days(day),
                Measurement::consumption(5.0),
                &pricing,
            );
            repos.energy_data().save(r).await.unwrap();
        }

        let analytics = Arc::new(AnalyticsService::new(repos, 30));
        let settings = ClientSettings {
            timeout: std::time::Duration::from_millis(100),
            retry_delay: std::time::Duration::from_millis(1),
            ..ClientSettings::default()
        };
        let client = Arc::new(RecommendationClient::new(generator, settings));
        (RecommendationService::new(analytics, client), user, device)
    }

    #[tokio::test]
    async fn general_recommendations_use_generator() {
        let echo = Arc::new(Echo { seen: Mutex::new(Vec::new()) });
        let (svc, user, _) = service(echo.clone()).await;

        let out = svc.general_recommendations(&user.id, 7, now()).await.unwrap();
        assert_eq!(out.outcome.source, RecommendationSource::Ai);
        assert_eq!(out.outcome.recommendations, vec!["Advice for recommendations"]);
        assert_eq!(out.summary.total_consumption_kwh, 35.0);
        assert_eq!(echo.seen.lock().unwrap().as_slice(), &[PromptKind::Recommendations]);
    }

    #[tokio::test]
    async fn generator_outage_degrades_to_fallback() {
        let (svc, user, device) = service(Arc::new(Down)).await;

        let out = svc.general_recommendations(&user.id, 7, now()).await.unwrap();
        assert_eq!(out.outcome.source, RecommendationSource::Fallback);
        // 35 kWh against a 7 kWh prorated goal.
        assert!(out.outcome.recommendations[0].starts_with("Consumption exceeds your goal by 400%"));
        assert!(out.outcome.degraded_reason.as_deref().unwrap().contains("connection refused"));

        let tips = svc.device_tips(&device.id, 7, now()).await.unwrap();
        assert!(tips.outcome.is_degraded());
        assert!(!tips.outcome.recommendations.is_empty());

        let report = svc.efficiency_report(&user.id, 7, now()).await.unwrap();
        assert!(report.outcome.is_degraded());
        assert!(!report.outcome.recommendations.is_empty());
    }

    #[tokio::test]
    async fn comparison_and_analysis() {
        let (svc, user, _) = service(Arc::new(Down)).await;

        let cmp = svc
            .usage_comparison(&user.id, ComparisonSpec::Preset(ComparisonPreset::Last7Days), now())
            .await
            .unwrap();
        // 7 readings in the current week, 3 in the one before.
        assert_eq!(cmp.comparison.current.total_consumption_kwh, 35.0);
        assert_eq!(cmp.comparison.baseline.total_consumption_kwh, 15.0);
        assert_eq!(cmp.trend, Trend::Increasing);

        let analysis = svc.energy_analysis(&user.id, AnalysisPeriod::Week, now()).await.unwrap();
        assert_eq!(analysis.window.days(), 7.0);
        assert!(!analysis.outcome.recommendations.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (svc, _, _) = service(Arc::new(Down)).await;
        let err = svc.general_recommendations("missing", 7, now()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn parses_analysis_period() {
        assert_eq!("Month".parse::<AnalysisPeriod>().unwrap().days(), 30);
        assert!("year".parse::<AnalysisPeriod>().is_err());
    }
}
