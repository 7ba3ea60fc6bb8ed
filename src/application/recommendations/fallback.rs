//! Rule-based advice used when the text generator is unavailable.
//!
//! Every function returns at least one item and at most `MAX_ITEMS`.

use std::collections::HashMap;

use crate::application::analytics::{
    DeviceSnapshot, EfficiencyReport, EnergySummary, Trend, UsageComparison, UserSnapshot,
};
use crate::domain::{DeviceType, EnergyData};

const MAX_ITEMS: usize = 8;
/// A peak this many times the average power is worth calling out.
const PEAK_FACTOR: f64 = 2.0;
const LOW_SCORE: u8 = 70;

fn finish(mut items: Vec<String>, general: &str) -> Vec<String> {
    items.push(general.to_string());
    items.dedup();
    items.truncate(MAX_ITEMS);
    items
}

fn category_tip(kind: DeviceType) -> Option<&'static str> {
    let tip = match kind {
        DeviceType::Hvac => {
            "Set the thermostat 1-2°C closer to the outdoor temperature and clean or replace HVAC filters regularly."
        }
        DeviceType::Lighting => {
            "Replace remaining incandescent or halogen bulbs with LEDs and switch lights off in empty rooms."
        }
        DeviceType::Appliance => {
            "Run dishwashers and washing machines with full loads and prefer eco or cold-water programs."
        }
        DeviceType::Electronics => {
            "Switch electronics fully off instead of leaving them on standby; a power strip makes this easy."
        }
        DeviceType::WaterHeater => {
            "Lower the water heater setpoint to around 50°C and insulate exposed hot-water pipes."
        }
        DeviceType::SolarPanel => {
            "Keep solar panels clean and unshaded to maintain their output."
        }
        DeviceType::SmartMeter | DeviceType::Other => return None,
    };
    Some(tip)
}

/// Consumption per device category, highest first.
fn consumption_by_category(snapshot: &UserSnapshot) -> Vec<(DeviceType, f64)> {
    let kinds: HashMap<&str, DeviceType> = snapshot
        .devices
        .iter()
        .map(|d| (d.id.as_str(), d.device_type))
        .collect();
    let mut totals: HashMap<DeviceType, f64> = HashMap::new();
    for r in &snapshot.records {
        let kind = kinds.get(r.device_id.as_str()).copied().unwrap_or(DeviceType::Other);
        *totals.entry(kind).or_default() += r.consumption_kwh;
    }
    let mut ranked: Vec<_> = totals.into_iter().filter(|(_, kwh)| *kwh > 0.0).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    ranked
}

fn peak_tip(summary: &EnergySummary) -> Option<String> {
    match (summary.peak_power_watts, summary.average_power_watts) {
        (Some(peak), Some(avg)) if avg > 0.0 && peak > avg * PEAK_FACTOR => Some(format!(
            "Peak power ({:.0} W) is more than twice the average ({:.0} W); stagger high-power devices instead of running them together.",
            peak, avg
        )),
        _ => None,
    }
}

/// General advice for a user's household.
pub fn general_recommendations(snapshot: &UserSnapshot) -> Vec<String> {
    let summary = &snapshot.summary;
    let goal = snapshot.user.goal();
    let ranked = consumption_by_category(snapshot);
    let top = ranked.first().map_or(DeviceType::Hvac, |(kind, _)| *kind);
    let mut items = Vec::new();

    if let Some(target) = goal.target_for_days(snapshot.window.days()) {
        if target > 0.0 && summary.total_consumption_kwh > target {
            let over = (summary.total_consumption_kwh - target) / target * 100.0;
            items.push(format!(
                "Consumption exceeds your goal by {:.0}% ({:.1} kWh against {:.1} kWh); consider reducing {} runtime.",
                over,
                summary.total_consumption_kwh,
                target,
                top.label()
            ));
        } else if summary.total_consumption_kwh > 0.0 {
            items.push(format!(
                "You are within your goal ({:.1} of {:.1} kWh for this period); keep it up.",
                summary.total_consumption_kwh, target
            ));
        }
    }

    if let Some(p) = goal.savings_percent.filter(|p| *p > 0.0) {
        let daily = summary.average_daily_consumption_kwh();
        if daily > 0.0 {
            items.push(format!(
                "To reach your {:.0}% savings target, aim for about {:.2} kWh per day instead of {:.2} kWh.",
                p,
                daily * (1.0 - p / 100.0),
                daily
            ));
        }
    }

    if let Some((kind, kwh)) = ranked.first() {
        if summary.total_consumption_kwh > 0.0 {
            items.push(format!(
                "{} devices account for {:.0}% of your consumption ({:.1} kWh); start there.",
                capitalize(kind.label()),
                kwh / summary.total_consumption_kwh * 100.0,
                kwh
            ));
        }
    }

    items.extend(peak_tip(summary));

    if summary.total_production_kwh > 0.0 {
        items.push(
            "Shift flexible loads such as laundry and dishwashing to hours when your own production is high."
                .to_string(),
        );
    }

    items.extend(ranked.iter().take(3).filter_map(|(kind, _)| category_tip(*kind)).map(String::from));

    if snapshot.devices.iter().any(|d| !d.is_smart_device && !d.device_type.is_generator()) {
        items.push(
            "Put non-smart devices on smart plugs or timers so they can be scheduled and monitored."
                .to_string(),
        );
    }

    if summary.is_empty() {
        items.push("Record readings for your devices regularly so advice can be based on your actual usage.".to_string());
    }

    finish(
        items,
        "Review your usage weekly and compare it with the previous week to catch changes early.",
    )
}

/// Tips for one device.
pub fn device_tips(snapshot: &DeviceSnapshot) -> Vec<String> {
    let device = &snapshot.device;
    let summary = &snapshot.summary;
    let mut items = Vec::new();

    if let (Some(rated), Some(avg)) = (device.rated_power_watts, summary.average_power_watts) {
        if rated > 0.0 {
            let utilization = avg / rated * 100.0;
            if utilization > 90.0 {
                items.push(format!(
                    "{} runs near its rated power ({:.0}% of {:.0} W) on average; check whether it is undersized or overworked.",
                    device.name, utilization, rated
                ));
            } else if utilization > 70.0 {
                items.push(format!(
                    "{} averages {:.0}% of its rated power; reduce its duty cycle where comfort allows.",
                    device.name, utilization
                ));
            }
        }
    }

    items.extend(peak_tip(summary));
    items.extend(category_tip(device.device_type).map(String::from));

    if !device.is_smart_device && !device.device_type.is_generator() {
        items.push(format!(
            "Use a smart plug or timer so {} only runs when it is needed.",
            device.name
        ));
    }

    if let Some(r) = night_usage(&snapshot.records) {
        items.push(r);
    }

    if summary.is_empty() {
        items.push(format!(
            "No recent readings for {}; record its consumption to get specific advice.",
            device.name
        ));
    }

    finish(
        items,
        "Schedule regular maintenance and consider a high-efficiency replacement when the device nears the end of its life.",
    )
}

fn night_usage(records: &[EnergyData]) -> Option<String> {
    use chrono::Timelike;
    let total: f64 = records.iter().map(|r| r.consumption_kwh).sum();
    if total <= 0.0 {
        return None;
    }
    let night: f64 = records
        .iter()
        .filter(|r| r.timestamp.hour() < 6)
        .map(|r| r.consumption_kwh)
        .sum();
    let share = night / total * 100.0;
    (share > 30.0).then(|| {
        format!(
            "{:.0}% of this device's consumption happens between midnight and 6 AM; check for standby draw or schedules left running.",
            share
        )
    })
}

/// Insights for a period-over-period comparison.
pub fn comparison_insights(cmp: &UsageComparison) -> Vec<String> {
    let consumption = &cmp.deltas.consumption;
    let mut items = Vec::new();

    match (cmp.trend(), consumption.percent_change) {
        (_, None) if consumption.current > 0.0 => items.push(
            "There is no usage in the baseline period, so a percentage change cannot be computed.".to_string(),
        ),
        (Trend::Increasing, Some(p)) => items.push(format!(
            "Consumption rose {:.1}% ({:+.2} kWh) against the baseline period; look for devices that ran longer than usual.",
            p, consumption.absolute_change
        )),
        (Trend::Decreasing, Some(p)) => items.push(format!(
            "Consumption fell {:.1}% ({:+.2} kWh) against the baseline period; keep the habits that made the difference.",
            p.abs(),
            consumption.absolute_change
        )),
        (Trend::Stable, Some(_)) => items.push(
            "Consumption is stable against the baseline period (within 5%).".to_string(),
        ),
        _ => {}
    }

    if let Some(p) = cmp.deltas.cost.percent_change.filter(|p| p.abs() >= 1.0) {
        items.push(format!(
            "Cost changed by {:+.1}% ({:+.2}).",
            p, cmp.deltas.cost.absolute_change
        ));
    }

    if cmp.deltas.production.absolute_change < 0.0 {
        items.push(format!(
            "Production dropped by {:.2} kWh; check panels for shading or soiling.",
            cmp.deltas.production.absolute_change.abs()
        ));
    }

    if let (Some(cur), Some(base)) = (cmp.current.peak_day(), cmp.baseline.peak_day()) {
        if cur.consumption_kwh > base.consumption_kwh {
            items.push(format!(
                "The busiest day this period ({}) used {:.2} kWh, more than the busiest baseline day ({:.2} kWh).",
                cur.date, cur.consumption_kwh, base.consumption_kwh
            ));
        }
    }

    finish(
        items,
        "Compare periods of equal length and similar weather for the most meaningful picture.",
    )
}

/// Observations on the daily pattern of a period.
pub fn pattern_insights(summary: &EnergySummary) -> Vec<String> {
    let mut items = Vec::new();
    let active: Vec<_> = summary.daily.iter().filter(|d| d.record_count > 0).collect();

    if let Some(peak) = summary.peak_day() {
        let avg = summary.average_daily_consumption_kwh();
        if avg > 0.0 {
            items.push(format!(
                "The highest-consumption day was {} with {:.2} kWh against a daily average of {:.2} kWh.",
                peak.date, peak.consumption_kwh, avg
            ));
        }
    }

    if active.len() >= 4 {
        let half = active.len() / 2;
        let first: f64 = active[..half].iter().map(|d| d.consumption_kwh).sum::<f64>() / half as f64;
        let second: f64 = active[half..].iter().map(|d| d.consumption_kwh).sum::<f64>()
            / (active.len() - half) as f64;
        if first > 0.0 {
            let change = (second - first) / first * 100.0;
            if change > 5.0 {
                items.push(format!(
                    "Daily consumption trended upwards by {:.0}% over the period.",
                    change
                ));
            } else if change < -5.0 {
                items.push(format!(
                    "Daily consumption trended downwards by {:.0}% over the period.",
                    change.abs()
                ));
            } else {
                items.push("Daily consumption was stable over the period.".to_string());
            }
        }
    }

    let gaps = summary.daily.len() - active.len();
    if gaps > 0 && !active.is_empty() {
        items.push(format!(
            "{} day(s) have no readings; gaps make trends harder to read.",
            gaps
        ));
    }

    items.extend(peak_tip(summary));

    finish(
        items,
        "Track usage by time of day to find the hours where shifting load saves the most.",
    )
}

/// Advice driven by device efficiency scores.
pub fn efficiency_recommendations(report: &EfficiencyReport) -> Vec<String> {
    let mut items = Vec::new();

    if let (Some(p), Some(target)) = (report.goal_progress_percent, report.goal_target_kwh) {
        if p > 100.0 {
            items.push(format!(
                "Consumption is at {:.0}% of the {:.1} kWh goal for this period.",
                p, target
            ));
        }
    }

    for d in report.underperformers(LOW_SCORE) {
        let mut reasons = Vec::new();
        if let Some(u) = d.utilization_percent.filter(|u| *u > 70.0) {
            reasons.push(format!("runs at {:.0}% of rated power", u));
        }
        if d.share_percent > 30.0 {
            reasons.push(format!("uses {:.0}% of household energy", d.share_percent));
        }
        if !d.is_smart_device {
            reasons.push("cannot be scheduled".to_string());
        }
        let because = if reasons.is_empty() {
            String::new()
        } else {
            format!(" because it {}", reasons.join(" and "))
        };
        items.push(format!(
            "{} scores {}/100{}; prioritise it for improvement.",
            d.name,
            d.efficiency_score.unwrap_or_default(),
            because
        ));
    }

    if report.devices.iter().all(|d| d.record_count == 0) {
        items.push("No device readings in this period; record consumption to get an efficiency score.".to_string());
    }

    finish(
        items,
        "Replace the oldest, lowest-scoring appliances first when upgrading to energy-efficient models.",
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
