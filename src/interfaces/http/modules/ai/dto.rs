//! Recommendation DTOs
//!
//! Every response flattens a [`RecommendationOutcomeDto`], so clients can
//! read `recommendations` and `source` the same way whether the generator
//! answered or the rule-based fallback did.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::application::analytics::{
    ComparisonPreset, ComparisonSpec, DeviceEfficiency, MetricDelta, Trend,
};
use crate::application::recommendations::{
    ComparisonInsights, DeviceTips, EfficiencyAnalysis, EnergyAnalysis, RecommendationOutcome,
    RecommendationSource, RecommendationStatus, UserRecommendations,
};
use crate::interfaces::http::modules::devices::DeviceDto;
use crate::interfaces::http::modules::statistics::{EnergySummaryDto, WindowDto};

const DEFAULT_COMPARISON_DAYS: u32 = 30;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecommendationOutcomeDto {
    pub recommendations: Vec<String>,
    /// `ai` or `fallback`
    pub source: String,
    pub model: Option<String>,
    pub cached: bool,
    /// True when the rule-based fallback answered
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

impl From<RecommendationOutcome> for RecommendationOutcomeDto {
    fn from(o: RecommendationOutcome) -> Self {
        let source = match o.source {
            RecommendationSource::Ai => "ai",
            RecommendationSource::Fallback => "fallback",
        };
        Self {
            degraded: o.is_degraded(),
            recommendations: o.recommendations,
            source: source.to_string(),
            model: o.model,
            cached: o.cached,
            degraded_reason: o.degraded_reason,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecommendationsResponse {
    pub user_id: String,
    pub window: WindowDto,
    pub device_count: usize,
    pub summary: EnergySummaryDto,
    #[serde(flatten)]
    pub outcome: RecommendationOutcomeDto,
}

impl From<UserRecommendations> for RecommendationsResponse {
    fn from(r: UserRecommendations) -> Self {
        Self {
            user_id: r.user_id,
            window: r.window.into(),
            device_count: r.device_count,
            summary: r.summary.into(),
            outcome: r.outcome.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OptimizationTipsResponse {
    pub device: DeviceDto,
    pub window: WindowDto,
    pub summary: EnergySummaryDto,
    #[serde(flatten)]
    pub outcome: RecommendationOutcomeDto,
}

impl From<DeviceTips> for OptimizationTipsResponse {
    fn from(t: DeviceTips) -> Self {
        Self {
            device: t.device.into(),
            window: t.window.into(),
            summary: t.summary.into(),
            outcome: t.outcome.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricDeltaDto {
    pub current: f64,
    pub baseline: f64,
    pub absolute_change: f64,
    /// Null when the baseline is zero and the current value is not
    pub percent_change: Option<f64>,
}

impl From<MetricDelta> for MetricDeltaDto {
    fn from(d: MetricDelta) -> Self {
        Self {
            current: d.current,
            baseline: d.baseline,
            absolute_change: d.absolute_change,
            percent_change: d.percent_change,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComparisonPeriodDto {
    pub window: WindowDto,
    pub summary: EnergySummaryDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComparisonDeltasDto {
    pub consumption: MetricDeltaDto,
    pub production: MetricDeltaDto,
    pub cost: MetricDeltaDto,
    pub net_energy: MetricDeltaDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComparisonResponse {
    pub user_id: String,
    pub current_period: ComparisonPeriodDto,
    pub baseline_period: ComparisonPeriodDto,
    pub deltas: ComparisonDeltasDto,
    /// `increasing`, `decreasing` or `stable`
    pub trend: String,
    #[serde(flatten)]
    pub outcome: RecommendationOutcomeDto,
}

fn trend_str(trend: Trend) -> &'static str {
    match trend {
        Trend::Increasing => "increasing",
        Trend::Decreasing => "decreasing",
        Trend::Stable => "stable",
    }
}

impl From<ComparisonInsights> for ComparisonResponse {
    fn from(c: ComparisonInsights) -> Self {
        let cmp = c.comparison;
        Self {
            user_id: c.user_id,
            current_period: ComparisonPeriodDto {
                window: cmp.windows.current.into(),
                summary: cmp.current.into(),
            },
            baseline_period: ComparisonPeriodDto {
                window: cmp.windows.baseline.into(),
                summary: cmp.baseline.into(),
            },
            deltas: ComparisonDeltasDto {
                consumption: cmp.deltas.consumption.into(),
                production: cmp.deltas.production.into(),
                cost: cmp.deltas.cost.into(),
                net_energy: cmp.deltas.net_energy.into(),
            },
            trend: trend_str(c.trend).to_string(),
            outcome: c.outcome.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnergyAnalysisResponse {
    pub user_id: String,
    pub time_period: String,
    pub window: WindowDto,
    pub summary: EnergySummaryDto,
    #[serde(flatten)]
    pub outcome: RecommendationOutcomeDto,
}

impl From<EnergyAnalysis> for EnergyAnalysisResponse {
    fn from(a: EnergyAnalysis) -> Self {
        Self {
            user_id: a.user_id,
            time_period: a.period.as_str().to_string(),
            window: a.window.into(),
            summary: a.summary.into(),
            outcome: a.outcome.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceEfficiencyDto {
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: bool,
    pub consumption_kwh: f64,
    pub cost: f64,
    pub record_count: u64,
    pub share_percent: f64,
    pub average_power_watts: Option<f64>,
    pub utilization_percent: Option<f64>,
    /// 0-100, null for devices without readings
    pub efficiency_score: Option<u8>,
}

impl From<DeviceEfficiency> for DeviceEfficiencyDto {
    fn from(d: DeviceEfficiency) -> Self {
        Self {
            device_id: d.device_id,
            name: d.name,
            device_type: d.device_type.to_string(),
            rated_power_watts: d.rated_power_watts,
            is_smart_device: d.is_smart_device,
            consumption_kwh: d.consumption_kwh,
            cost: d.cost,
            record_count: d.record_count,
            share_percent: d.share_percent,
            average_power_watts: d.average_power_watts,
            utilization_percent: d.utilization_percent,
            efficiency_score: d.efficiency_score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EfficiencyReportResponse {
    pub user_id: String,
    pub window: WindowDto,
    pub summary: EnergySummaryDto,
    pub goal_target_kwh: Option<f64>,
    pub goal_progress_percent: Option<f64>,
    pub overall_score: Option<u8>,
    pub devices: Vec<DeviceEfficiencyDto>,
    #[serde(flatten)]
    pub outcome: RecommendationOutcomeDto,
}

impl From<EfficiencyAnalysis> for EfficiencyReportResponse {
    fn from(a: EfficiencyAnalysis) -> Self {
        let report = a.report;
        Self {
            user_id: a.user_id,
            window: report.window.into(),
            summary: report.summary.into(),
            goal_target_kwh: report.goal_target_kwh,
            goal_progress_percent: report.goal_progress_percent,
            overall_score: report.overall_score,
            devices: report.devices.into_iter().map(DeviceEfficiencyDto::from).collect(),
            outcome: a.outcome.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AiStatusDto {
    pub configured: bool,
    pub model: String,
    pub timeout_secs: u64,
    pub cache_enabled: bool,
    /// `ai` when a generator is configured, otherwise `fallback`
    pub mode: String,
}

impl From<RecommendationStatus> for AiStatusDto {
    fn from(s: RecommendationStatus) -> Self {
        Self {
            configured: s.configured,
            model: s.model,
            timeout_secs: s.timeout_secs,
            cache_enabled: s.cache_enabled,
            mode: s.mode.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendationsQuery {
    /// Days of history to analyse, 1-365 (default 30)
    #[validate(range(min = 1, max = 365))]
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TipsQuery {
    /// Days of history to analyse, 1-30 (default 7)
    #[validate(range(min = 1, max = 30))]
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalysisQuery {
    /// week, month or quarter (default week)
    pub time_period: Option<String>,
}

pub(crate) fn validate_preset(preset: &str) -> Result<(), ValidationError> {
    preset.parse::<ComparisonPreset>().map(|_| ()).map_err(|_| {
        ValidationError::new("preset").with_message(
            "must be one of this_week_vs_last_week, this_month_vs_last_month, last_7_days, last_30_days"
                .into(),
        )
    })
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompareQuery {
    /// Named window pair; takes precedence over the day counts
    #[validate(custom(function = "validate_preset"))]
    pub preset: Option<String>,
    /// Length of the recent period in days (default 30)
    #[validate(range(min = 1, max = 365))]
    pub period1_days: Option<u32>,
    /// Length of the earlier period in days (default 30)
    #[validate(range(min = 1, max = 365))]
    pub period2_days: Option<u32>,
}

impl CompareQuery {
    pub fn spec(&self) -> ComparisonSpec {
        match self.preset.as_deref().and_then(|p| p.parse().ok()) {
            Some(preset) => ComparisonSpec::Preset(preset),
            None => ComparisonSpec::Days {
                current_days: self.period1_days.unwrap_or(DEFAULT_COMPARISON_DAYS),
                baseline_days: self.period2_days.unwrap_or(DEFAULT_COMPARISON_DAYS),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_wins_over_day_counts() {
        let q = CompareQuery {
            preset: Some("last_7_days".into()),
            period1_days: Some(10),
            period2_days: None,
        };
        assert!(q.validate().is_ok());
        assert_eq!(q.spec(), ComparisonSpec::Preset(ComparisonPreset::Last7Days));
    }

    #[test]
    fn day_counts_default_to_thirty() {
        let q = CompareQuery {
            period1_days: Some(14),
            ..Default::default()
        };
        assert_eq!(
            q.spec(),
            ComparisonSpec::Days {
                current_days: 14,
                baseline_days: 30
            }
        );
    }

    #[test]
    fn unknown_preset_fails_validation() {
        let q = CompareQuery {
            preset: Some("fortnight".into()),
            ..Default::default()
        };
        let errors = q.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("preset"));
    }

    #[test]
    fn tips_window_is_capped_at_thirty_days() {
        assert!(TipsQuery { days: Some(31) }.validate().is_err());
        assert!(TipsQuery { days: Some(30) }.validate().is_ok());
    }
}
