//! Period-over-period comparison
//!
//! Window resolution takes `now` as an argument so presets are
//! deterministic under test.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::statistics::{summarize, EnergySummary};
use crate::domain::{EnergyData, TimeWindow};
use crate::shared::{round_f64, to_decimal};

/// Relative changes within this band count as stable.
const STABLE_BAND_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPreset {
    /// Week to date against the same span of the previous ISO week.
    ThisWeekVsLastWeek,
    /// Month to date against the same span of the previous month.
    ThisMonthVsLastMonth,
    /// Rolling 7 days against the 7 days before.
    Last7Days,
    /// Rolling 30 days against the 30 days before.
    Last30Days,
}

impl ComparisonPreset {
    pub const ALL: [ComparisonPreset; 4] = [
        ComparisonPreset::ThisWeekVsLastWeek,
        ComparisonPreset::ThisMonthVsLastMonth,
        ComparisonPreset::Last7Days,
        ComparisonPreset::Last30Days,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonPreset::ThisWeekVsLastWeek => "this_week_vs_last_week",
            ComparisonPreset::ThisMonthVsLastMonth => "this_month_vs_last_month",
            ComparisonPreset::Last7Days => "last_7_days",
            ComparisonPreset::Last30Days => "last_30_days",
        }
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> ComparisonWindows {
        match self {
            ComparisonPreset::ThisWeekVsLastWeek => {
                let monday = now.date_naive()
                    - Duration::days(i64::from(now.weekday().num_days_from_monday()));
                let current = window_from(midnight(monday), now);
                let prev_start = current.start - Duration::weeks(1);
                ComparisonWindows {
                    current,
                    baseline: window_from(prev_start, prev_start + current.duration()),
                }
            }
            ComparisonPreset::ThisMonthVsLastMonth => {
                let month_start = first_of_month(now.year(), now.month());
                let (py, pm) = if now.month() == 1 {
                    (now.year() - 1, 12)
                } else {
                    (now.year(), now.month() - 1)
                };
                let prev_start = first_of_month(py, pm);
                let current = window_from(month_start, now);
                let prev_end = (prev_start + current.duration()).min(month_start);
                ComparisonWindows {
                    current,
                    baseline: window_from(prev_start, prev_end),
                }
            }
            ComparisonPreset::Last7Days => ComparisonWindows::rolling(now, 7, 7),
            ComparisonPreset::Last30Days => ComparisonWindows::rolling(now, 30, 30),
        }
    }
}

impl std::fmt::Display for ComparisonPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComparisonPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComparisonPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown comparison preset '{}'", s))
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn first_of_month(year: i32, month: u32) -> DateTime<Utc> {
    // Day 1 exists for every valid month.
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    midnight(date)
}

/// Bounds computed here are ordered by construction.
fn window_from(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
    TimeWindow {
        start: start.min(end),
        end,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComparisonWindows {
    pub current: TimeWindow,
    pub baseline: TimeWindow,
}

impl ComparisonWindows {
    /// The last `current_days` days against the `baseline_days` before them.
    pub fn rolling(now: DateTime<Utc>, current_days: u32, baseline_days: u32) -> Self {
        let current = TimeWindow::last_days(now, current_days);
        let baseline = current.preceding(Duration::days(i64::from(baseline_days)));
        Self { current, baseline }
    }

    /// Smallest window covering both periods; used to fetch records once.
    pub fn span(&self) -> TimeWindow {
        window_from(
            self.current.start.min(self.baseline.start),
            self.current.end.max(self.baseline.end),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub current: f64,
    pub baseline: f64,
    pub absolute_change: f64,
    /// `None` when the baseline is zero and the current value is not, or
    /// when the ratio does not fit a `Decimal`.
    pub percent_change: Option<f64>,
}

impl MetricDelta {
    pub fn between(current: f64, baseline: f64) -> Self {
        let (c, b) = (to_decimal(current), to_decimal(baseline));
        let change = c.saturating_sub(b);
        // Baselines too small to divide by are treated like zero.
        let percent_change = if b.is_zero() {
            change.is_zero().then_some(0.0)
        } else {
            change
                .checked_div(b.abs())
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map(|p| round_f64(p, 2))
        };
        Self {
            current,
            baseline,
            absolute_change: round_f64(change, 6),
            percent_change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaReport {
    pub consumption: MetricDelta,
    pub production: MetricDelta,
    pub cost: MetricDelta,
    pub net_energy: MetricDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageComparison {
    pub windows: ComparisonWindows,
    pub current: EnergySummary,
    pub baseline: EnergySummary,
    pub deltas: DeltaReport,
}

impl UsageComparison {
    /// Direction of consumption. An undefined percentage with growth counts
    /// as increasing.
    pub fn trend(&self) -> Trend {
        let delta = &self.deltas.consumption;
        match delta.percent_change {
            Some(p) if p > STABLE_BAND_PERCENT => Trend::Increasing,
            Some(p) if p < -STABLE_BAND_PERCENT => Trend::Decreasing,
            Some(_) => Trend::Stable,
            None if delta.absolute_change > 0.0 => Trend::Increasing,
            None => Trend::Stable,
        }
    }
}

pub fn compare_summaries(
    windows: ComparisonWindows,
    current: EnergySummary,
    baseline: EnergySummary,
) -> UsageComparison {
    let deltas = DeltaReport {
        consumption: MetricDelta::between(
            current.total_consumption_kwh,
            baseline.total_consumption_kwh,
        ),
        production: MetricDelta::between(
            current.total_production_kwh,
            baseline.total_production_kwh,
        ),
        cost: MetricDelta::between(current.total_cost, baseline.total_cost),
        net_energy: MetricDelta::between(current.net_energy_kwh, baseline.net_energy_kwh),
    };
    UsageComparison {
        windows,
        current,
        baseline,
        deltas,
    }
}

/// Summarise both windows over one record set and derive the deltas.
pub fn compare(records: &[EnergyData], windows: ComparisonWindows) -> UsageComparison {
    let current = summarize(records, Some(&windows.current));
    let baseline = summarize(records, Some(&windows.baseline));
    compare_summaries(windows, current, baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Device, DeviceType, Measurement, Pricing};

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn week_of(device: &Device, first_day: u32, kwh_per_day: f64) -> Vec<EnergyData> {
        (0..7)
            .map(|i| {
                EnergyData::record(
                    device,
                    ts(2024, 5, first_day + i, 12),
                    Measurement::consumption(kwh_per_day),
                    &Pricing::new(0.2, "USD"),
                )
            })
            .collect()
    }

    #[test]
    fn week_a_70_to_week_b_84_is_plus_20_percent() {
        let device = Device::new("u1", "AC", DeviceType::Hvac);
        let mut records = week_of(&device, 1, 10.0);
        records.extend(week_of(&device, 8, 12.0));

        let windows = ComparisonWindows {
            baseline: TimeWindow::new(ts(2024, 5, 1, 0), ts(2024, 5, 8, 0)).unwrap(),
            current: TimeWindow::new(ts(2024, 5, 8, 0), ts(2024, 5, 15, 0)).unwrap(),
        };
        let cmp = compare(&records, windows);

        assert_eq!(cmp.baseline.total_consumption_kwh, 70.0);
        assert_eq!(cmp.current.total_consumption_kwh, 84.0);
        assert_eq!(cmp.deltas.consumption.absolute_change, 14.0);
        assert_eq!(cmp.deltas.consumption.percent_change, Some(20.0));
        assert_eq!(cmp.deltas.cost.percent_change, Some(20.0));
        assert_eq!(cmp.trend(), Trend::Increasing);
    }

    #[test]
    fn self_comparison_is_zero_everywhere() {
        let device = Device::new("u1", "Lamp", DeviceType::Lighting);
        let records = week_of(&device, 1, 3.0);
        let w = TimeWindow::new(ts(2024, 5, 1, 0), ts(2024, 5, 8, 0)).unwrap();

        let cmp = compare(&records, ComparisonWindows { current: w, baseline: w });
        for delta in [
            cmp.deltas.consumption,
            cmp.deltas.production,
            cmp.deltas.cost,
            cmp.deltas.net_energy,
        ] {
            assert_eq!(delta.absolute_change, 0.0);
            assert_eq!(delta.percent_change, Some(0.0));
        }
        assert_eq!(cmp.trend(), Trend::Stable);
    }

    #[test]
    fn zero_baseline_has_undefined_percentage() {
        let d = MetricDelta::between(12.0, 0.0);
        assert_eq!(d.absolute_change, 12.0);
        assert_eq!(d.percent_change, None);

        let json = serde_json::to_value(d).unwrap();
        assert!(json["percent_change"].is_null());
    }

    #[test]
    fn vanishing_baseline_has_undefined_percentage() {
        let d = MetricDelta::between(1000.0, 1e-27);
        assert_eq!(d.absolute_change, 1000.0);
        assert_eq!(d.percent_change, None);
    }

    #[test]
    fn decrease_is_negative() {
        let d = MetricDelta::between(45.0, 60.0);
        assert_eq!(d.percent_change, Some(-25.0));
    }

    #[test]
    fn negative_baseline_keeps_direction() {
        // Net energy of a producing household can be negative.
        let d = MetricDelta::between(-1.0, -2.0);
        assert_eq!(d.percent_change, Some(50.0));
    }

    #[test]
    fn week_preset_resolves_from_monday() {
        // Wednesday noon.
        let now = ts(2024, 5, 15, 12);
        let w = ComparisonPreset::ThisWeekVsLastWeek.resolve(now);

        assert_eq!(w.current.start, ts(2024, 5, 13, 0));
        assert_eq!(w.current.end, now);
        assert_eq!(w.baseline.start, ts(2024, 5, 6, 0));
        assert_eq!(w.baseline.end, ts(2024, 5, 8, 12));
    }

    #[test]
    fn month_preset_clamps_to_previous_month() {
        let now = ts(2024, 3, 31, 12);
        let w = ComparisonPreset::ThisMonthVsLastMonth.resolve(now);

        assert_eq!(w.current.start, ts(2024, 3, 1, 0));
        assert_eq!(w.baseline.start, ts(2024, 2, 1, 0));
        assert_eq!(w.baseline.end, ts(2024, 3, 1, 0));
    }

    #[test]
    fn month_preset_wraps_year() {
        let w = ComparisonPreset::ThisMonthVsLastMonth.resolve(ts(2024, 1, 10, 0));
        assert_eq!(w.baseline.start, ts(2023, 12, 1, 0));
        assert_eq!(w.baseline.end, ts(2023, 12, 10, 0));
    }

    #[test]
    fn rolling_presets_abut() {
        let now = ts(2024, 5, 31, 0);
        let w = ComparisonPreset::Last7Days.resolve(now);
        assert_eq!(w.current.start, ts(2024, 5, 24, 0));
        assert_eq!(w.baseline.end, w.current.start);
        assert_eq!(w.baseline.start, ts(2024, 5, 17, 0));
        assert_eq!(w.span().start, w.baseline.start);
        assert_eq!(w.span().end, now);
    }

    #[test]
    fn presets_parse() {
        for p in ComparisonPreset::ALL {
            assert_eq!(p.as_str().parse::<ComparisonPreset>().unwrap(), p);
        }
        assert!("fortnight".parse::<ComparisonPreset>().is_err());
    }
}
