//! Per-device efficiency scoring
//!
//! Scores start at 100 and lose points for sustained draw close to the
//! rated power, a dominant share of household consumption, and missing
//! smart control. The household score is the consumption-weighted mean of
//! device scores, reduced further when the prorated goal is exceeded.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::statistics::{summarize, EnergySummary};
use crate::domain::{Device, DeviceType, EnergyData, EnergyGoal, TimeWindow};
use crate::shared::{round_f64, to_decimal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEfficiency {
    pub device_id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: bool,
    pub consumption_kwh: f64,
    pub cost: f64,
    pub record_count: u64,
    /// Share of the household's consumption in the window.
    pub share_percent: f64,
    pub average_power_watts: Option<f64>,
    /// Average power as a percentage of rated power.
    pub utilization_percent: Option<f64>,
    /// `None` for devices without readings in the window.
    pub efficiency_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyReport {
    pub window: TimeWindow,
    pub summary: EnergySummary,
    pub goal_target_kwh: Option<f64>,
    /// Consumption as a percentage of the prorated goal.
    pub goal_progress_percent: Option<f64>,
    pub overall_score: Option<u8>,
    /// Highest consumption first.
    pub devices: Vec<DeviceEfficiency>,
}

impl EfficiencyReport {
    /// Devices scoring below `threshold`, worst first.
    pub fn underperformers(&self, threshold: u8) -> Vec<&DeviceEfficiency> {
        let mut low: Vec<&DeviceEfficiency> = self
            .devices
            .iter()
            .filter(|d| d.efficiency_score.is_some_and(|s| s < threshold))
            .collect();
        low.sort_by_key(|d| d.efficiency_score);
        low
    }
}

/// 0 for an empty whole; saturates when the ratio overflows.
fn percent(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    let ratio = part
        .checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX);
    round_f64(ratio, 2)
}

fn device_score(utilization: Option<f64>, share: f64, is_smart: bool) -> u8 {
    let mut score: i32 = 100;
    match utilization {
        Some(u) if u > 90.0 => score -= 25,
        Some(u) if u > 70.0 => score -= 10,
        _ => {}
    }
    if share > 50.0 {
        score -= 20;
    } else if share > 30.0 {
        score -= 10;
    }
    if !is_smart {
        score -= 5;
    }
    score.clamp(0, 100) as u8
}

pub fn build_report(
    devices: &[Device],
    records: &[EnergyData],
    window: &TimeWindow,
    goal: EnergyGoal,
) -> EfficiencyReport {
    let summary = summarize(records, Some(window));
    let total = to_decimal(summary.total_consumption_kwh);

    let mut by_device: HashMap<&str, Vec<EnergyData>> = HashMap::new();
    for r in records.iter().filter(|r| window.contains(r.timestamp)) {
        by_device.entry(r.device_id.as_str()).or_default().push(r.clone());
    }

    let mut rows: Vec<DeviceEfficiency> = devices
        .iter()
        .map(|device| {
            let own = by_device.remove(device.id.as_str()).unwrap_or_default();
            let s = summarize(&own, None);
            let share = percent(to_decimal(s.total_consumption_kwh), total);
            let utilization = match (s.average_power_watts, device.rated_power_watts) {
                (Some(avg), Some(rated)) if rated > 0.0 => {
                    Some(percent(to_decimal(avg), to_decimal(rated)))
                }
                _ => None,
            };
            let score = (!s.is_empty())
                .then(|| device_score(utilization, share, device.is_smart_device));

            DeviceEfficiency {
                device_id: device.id.clone(),
                name: device.name.clone(),
                device_type: device.device_type,
                rated_power_watts: device.rated_power_watts,
                is_smart_device: device.is_smart_device,
                consumption_kwh: s.total_consumption_kwh,
                cost: s.total_cost,
                record_count: s.record_count,
                share_percent: share,
                average_power_watts: s.average_power_watts,
                utilization_percent: utilization,
                efficiency_score: score,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.consumption_kwh.total_cmp(&a.consumption_kwh));

    let goal_target = goal.target_for_days(window.days());
    let goal_progress = goal_target
        .filter(|t| *t > 0.0)
        .map(|t| percent(total, to_decimal(t)));

    let overall_score = weighted_score(&rows).map(|score| {
        let overrun = goal_progress.map_or(0.0, |p| (p - 100.0).max(0.0));
        let penalty = (overrun / 2.0).min(30.0);
        (f64::from(score) - penalty).clamp(0.0, 100.0).round() as u8
    });

    EfficiencyReport {
        window: *window,
        summary,
        goal_target_kwh: goal_target.map(|t| round_f64(to_decimal(t), 3)),
        goal_progress_percent: goal_progress,
        overall_score,
        devices: rows,
    }
}

fn weighted_score(rows: &[DeviceEfficiency]) -> Option<u8> {
    let scored: Vec<(f64, u8)> = rows
        .iter()
        .filter_map(|r| r.efficiency_score.map(|s| (r.consumption_kwh, s)))
        .collect();
    if scored.is_empty() {
        return None;
    }
    let weight: f64 = scored.iter().map(|(w, _)| w).sum();
    let score = if weight > 0.0 {
        scored.iter().map(|(w, s)| w * f64::from(*s)).sum::<f64>() / weight
    } else {
        scored.iter().map(|(_, s)| f64::from(*s)).sum::<f64>() / scored.len() as f64
    };
    Some(score.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Measurement, Pricing};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 12, 0, 0).unwrap()
    }

    fn reading(device: &Device, day: u32, kwh: f64, watts: f64) -> EnergyData {
        let m = Measurement {
            power_watts: Some(watts),
            ..Measurement::consumption(kwh)
        };
        EnergyData::record(device, ts(day), m, &Pricing::new(0.2, "USD"))
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 11, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn scores_penalise_high_utilisation_and_share() {
        let mut ac = Device::new("u1", "AC", DeviceType::Hvac);
        ac.rated_power_watts = Some(2000.0);
        let mut lamp = Device::new("u1", "Lamp", DeviceType::Lighting);
        lamp.rated_power_watts = Some(100.0);
        lamp.is_smart_device = true;

        let records = vec![reading(&ac, 1, 30.0, 1900.0), reading(&lamp, 1, 1.0, 20.0)];
        let report = build_report(&[ac.clone(), lamp.clone()], &records, &window(), EnergyGoal::default());

        assert_eq!(report.devices[0].device_id, ac.id);
        // 95% utilisation, >50% share, not smart.
        assert_eq!(report.devices[0].efficiency_score, Some(50));
        assert_eq!(report.devices[0].utilization_percent, Some(95.0));
        assert_eq!(report.devices[1].efficiency_score, Some(100));
        assert_eq!(report.underperformers(70).len(), 1);
        assert!(report.overall_score.is_some());
    }

    #[test]
    fn percent_of_tiny_whole_saturates() {
        assert_eq!(percent(Decimal::ONE, Decimal::ZERO), 0.0);
        assert_eq!(percent(Decimal::from(1000), to_decimal(1e-27)), round_f64(Decimal::MAX, 2));
        assert_eq!(percent(Decimal::ONE, Decimal::from(4)), 25.0);
    }

    #[test]
    fn device_without_readings_is_unscored() {
        let idle = Device::new("u1", "Spare fridge", DeviceType::Appliance);
        let report = build_report(&[idle], &[], &window(), EnergyGoal::default());

        assert_eq!(report.devices[0].efficiency_score, None);
        assert_eq!(report.devices[0].share_percent, 0.0);
        assert_eq!(report.overall_score, None);
        assert!(report.summary.is_empty());
    }

    #[test]
    fn goal_overrun_lowers_overall_score() {
        let mut tv = Device::new("u1", "TV", DeviceType::Electronics);
        tv.is_smart_device = true;
        let records = vec![reading(&tv, 2, 20.0, 100.0)];
        // 30 kWh/month over 10 days is a 10 kWh target, so 200% progress.
        let goal = EnergyGoal {
            monthly_kwh: Some(30.0),
            savings_percent: None,
        };

        let report = build_report(&[tv], &records, &window(), goal);
        assert_eq!(report.goal_target_kwh, Some(10.0));
        assert_eq!(report.goal_progress_percent, Some(200.0));
        // Single device owns 100% share (-20), penalty capped at 30.
        assert_eq!(report.overall_score, Some(50));
    }
}
