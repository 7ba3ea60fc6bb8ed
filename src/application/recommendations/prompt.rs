//! Prompt construction
//!
//! Every prompt asks for a numbered list with one item per line, which is
//! the convention the parser understands first.

use serde::Serialize;

use crate::application::analytics::{EfficiencyReport, EnergySummary, UsageComparison};
use crate::domain::{Device, EnergyData, EnergyUnit, User};

/// Readings quoted verbatim in user-level prompts.
const USER_RECENT_READINGS: usize = 5;
/// Readings quoted verbatim in device prompts.
const DEVICE_RECENT_READINGS: usize = 10;

const LIST_INSTRUCTIONS: &str = "Answer with a numbered list, one item per line, \
no headings and no introduction. Keep every item to one or two sentences.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Recommendations,
    DeviceOptimization,
    UsageComparison,
    PatternAnalysis,
    EfficiencyReport,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Recommendations => "recommendations",
            PromptKind::DeviceOptimization => "device_optimization",
            PromptKind::UsageComparison => "usage_comparison",
            PromptKind::PatternAnalysis => "pattern_analysis",
            PromptKind::EfficiencyReport => "efficiency_report",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            PromptKind::Recommendations => 0.7,
            PromptKind::DeviceOptimization => 0.5,
            PromptKind::UsageComparison => 0.4,
            PromptKind::PatternAnalysis => 0.3,
            PromptKind::EfficiencyReport => 0.5,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            PromptKind::Recommendations => 2000,
            PromptKind::PatternAnalysis => 1500,
            _ => 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Prompt {
    fn new(kind: PromptKind, system: String, user: String) -> Self {
        Self {
            kind,
            system,
            user,
            temperature: kind.temperature(),
            max_tokens: kind.max_tokens(),
        }
    }
}

fn or_unknown<T: std::fmt::Display>(value: Option<T>, suffix: &str) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| format!("{}{}", v, suffix))
}

fn profile_lines(user: &User, window_days: Option<f64>) -> Vec<String> {
    let goal = user.goal();
    let mut lines = vec![
        "USER PROFILE:".to_string(),
        format!(
            "- Energy goal: {}",
            goal.monthly_kwh
                .map_or_else(|| "not set".to_string(), |g| format!("{:.1} kWh/month", g))
        ),
    ];
    if let Some(target) = window_days.and_then(|d| goal.target_for_days(d)) {
        lines.push(format!("- Goal for this period: {:.2} kWh", target));
    }
    if let Some(p) = goal.savings_percent {
        lines.push(format!("- Savings target: {:.0}% reduction", p));
    }
    lines.push(format!(
        "- Preferred temperature: {}",
        user.preferred_temperature_celsius
            .map_or_else(|| "not set".to_string(), |t| format!("{:.1}°C", t))
    ));
    lines
}

fn summary_lines(title: &str, s: &EnergySummary, unit: EnergyUnit) -> Vec<String> {
    let mut lines = vec![
        format!("{}:", title),
        format!("- Total consumption: {}", unit.format(s.total_consumption_kwh)),
        format!("- Total production: {}", unit.format(s.total_production_kwh)),
        format!("- Net energy: {}", unit.format(s.net_energy_kwh)),
        format!("- Total cost: {:.2}", s.total_cost),
        format!("- Readings: {}", s.record_count),
        format!("- Average power: {}", or_unknown(s.average_power_watts, " W")),
        format!("- Peak power: {}", or_unknown(s.peak_power_watts, " W")),
    ];
    if let (Some(start), Some(end)) = (s.period_start, s.period_end) {
        lines.push(format!(
            "- Period: {} to {}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ));
    }
    lines
}

fn device_line(d: &Device) -> String {
    format!(
        "- {} ({}), location: {}, rated power: {}, smart: {}",
        d.name,
        d.device_type.label(),
        d.location.as_deref().unwrap_or("not specified"),
        or_unknown(d.rated_power_watts, " W"),
        if d.is_smart_device { "yes" } else { "no" }
    )
}

fn reading_lines(records: &[EnergyData], take: usize, unit: EnergyUnit) -> Vec<String> {
    let skip = records.len().saturating_sub(take);
    records[skip..]
        .iter()
        .map(|r| {
            let mut line = format!(
                "- {}: {}, {}",
                r.timestamp.format("%Y-%m-%d %H:%M"),
                unit.format(r.consumption_kwh),
                or_unknown(r.power_watts, " W")
            );
            if let Some(t) = r.temperature_celsius {
                line.push_str(&format!(", {:.1}°C", t));
            }
            line
        })
        .collect()
}

/// General conservation advice for a user.
pub fn recommendations(
    user: &User,
    summary: &EnergySummary,
    window_days: f64,
    devices: &[Device],
    records: &[EnergyData],
) -> Prompt {
    let unit = user.preferred_unit;
    let mut body = profile_lines(user, Some(window_days));
    body.push(String::new());
    body.extend(summary_lines("CURRENT ENERGY STATISTICS", summary, unit));
    body.push(String::new());
    body.push(format!("DEVICES ({} total):", devices.len()));
    body.extend(devices.iter().map(device_line));
    if !records.is_empty() {
        body.push(String::new());
        body.push(format!(
            "RECENT READINGS (last {}):",
            records.len().min(USER_RECENT_READINGS)
        ));
        body.extend(reading_lines(records, USER_RECENT_READINGS, unit));
    }
    body.push(String::new());
    body.push("Give 3 to 6 practical, specific recommendations to reduce consumption and cost.".into());

    Prompt::new(
        PromptKind::Recommendations,
        format!(
            "You are an expert energy conservation advisor. You analyse household energy data \
             and give personalised, actionable advice. {}",
            LIST_INSTRUCTIONS
        ),
        body.join("\n"),
    )
}

/// Optimisation tips for one device, including its category and rated power.
pub fn device_optimization(
    device: &Device,
    owner: &User,
    summary: &EnergySummary,
    window_days: f64,
    records: &[EnergyData],
) -> Prompt {
    let unit = owner.preferred_unit;
    let mut body = vec![
        "DEVICE INFORMATION:".to_string(),
        format!("- Name: {}", device.name),
        format!("- Category: {}", device.device_type.label()),
        format!("- Rated power: {}", or_unknown(device.rated_power_watts, " W")),
        format!("- Model: {}", device.model.as_deref().unwrap_or("unknown")),
        format!("- Manufacturer: {}", device.manufacturer.as_deref().unwrap_or("unknown")),
        format!("- Location: {}", device.location.as_deref().unwrap_or("not specified")),
        format!("- Smart device: {}", if device.is_smart_device { "yes" } else { "no" }),
        String::new(),
    ];
    body.extend(profile_lines(owner, Some(window_days)));
    body.push(String::new());
    body.extend(summary_lines("DEVICE STATISTICS", summary, unit));
    body.push(String::new());
    if records.is_empty() {
        body.push("No recent readings are available for this device.".into());
    } else {
        body.push("RECENT READINGS:".into());
        body.extend(reading_lines(records, DEVICE_RECENT_READINGS, unit));
    }

    Prompt::new(
        PromptKind::DeviceOptimization,
        format!(
            "You are an expert on {} energy optimisation. Give specific tips for this device, \
             including maintenance and when replacement is worth considering. {}",
            device.device_type.label(),
            LIST_INSTRUCTIONS
        ),
        body.join("\n"),
    )
}

/// Insights on a period-over-period comparison.
pub fn usage_comparison(user: &User, cmp: &UsageComparison) -> Prompt {
    let unit = user.preferred_unit;
    let pct = |p: Option<f64>| p.map_or_else(|| "n/a (no baseline)".to_string(), |v| format!("{:+.2}%", v));

    let mut body = profile_lines(user, Some(cmp.windows.current.days()));
    body.push(String::new());
    body.extend(summary_lines("CURRENT PERIOD", &cmp.current, unit));
    body.push(String::new());
    body.extend(summary_lines("BASELINE PERIOD", &cmp.baseline, unit));
    body.push(String::new());
    body.push("CHANGES:".into());
    body.push(format!(
        "- Consumption: {:+.2} kWh ({})",
        cmp.deltas.consumption.absolute_change,
        pct(cmp.deltas.consumption.percent_change)
    ));
    body.push(format!(
        "- Production: {:+.2} kWh ({})",
        cmp.deltas.production.absolute_change,
        pct(cmp.deltas.production.percent_change)
    ));
    body.push(format!(
        "- Cost: {:+.2} ({})",
        cmp.deltas.cost.absolute_change,
        pct(cmp.deltas.cost.percent_change)
    ));

    Prompt::new(
        PromptKind::UsageComparison,
        format!(
            "You are an energy analyst. Explain what changed between the two periods, likely \
             causes, and what to do next. {}",
            LIST_INSTRUCTIONS
        ),
        body.join("\n"),
    )
}

/// Trend and anomaly analysis over the daily breakdown.
pub fn pattern_analysis(user: &User, summary: &EnergySummary, period_label: &str) -> Prompt {
    let unit = user.preferred_unit;
    let mut body = vec![format!(
        "Energy consumption for {} analysis ({} readings):",
        period_label, summary.record_count
    )];
    body.push(String::new());
    body.push("DAILY SUMMARY:".into());
    body.extend(summary.daily.iter().map(|d| {
        format!(
            "- {}: {}, average power {}",
            d.date,
            unit.format(d.consumption_kwh),
            or_unknown(d.average_power_watts, " W")
        )
    }));
    body.push(String::new());
    body.extend(summary_lines("TOTALS", summary, unit));

    Prompt::new(
        PromptKind::PatternAnalysis,
        format!(
            "You are an energy analyst. Identify trends, anomalies and peak usage patterns in \
             the data. {}",
            LIST_INSTRUCTIONS
        ),
        body.join("\n"),
    )
}

/// Recommendations driven by per-device efficiency scores.
pub fn efficiency_report(user: &User, report: &EfficiencyReport) -> Prompt {
    let unit = user.preferred_unit;
    let mut body = profile_lines(user, Some(report.window.days()));
    body.push(String::new());
    body.push(format!(
        "OVERALL EFFICIENCY SCORE: {}",
        or_unknown(report.overall_score, "/100")
    ));
    if let Some(p) = report.goal_progress_percent {
        body.push(format!("GOAL PROGRESS: {:.1}% of the period target used", p));
    }
    body.push(String::new());
    body.push("DEVICES:".into());
    body.extend(report.devices.iter().map(|d| {
        format!(
            "- {} ({}): {}, {:.1}% of household use, utilisation {}, score {}",
            d.name,
            d.device_type.label(),
            unit.format(d.consumption_kwh),
            d.share_percent,
            or_unknown(d.utilization_percent, "%"),
            or_unknown(d.efficiency_score, "/100")
        )
    }));

    Prompt::new(
        PromptKind::EfficiencyReport,
        format!(
            "You are an energy efficiency auditor. Prioritise improvements for the \
             lowest-scoring devices. {}",
            LIST_INSTRUCTIONS
        ),
        body.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analytics::summarize;
    use crate::domain::{DeviceType, Measurement, Pricing};
    use chrono::Utc;

    fn user_with_goal() -> User {
        let mut user = User::new("p@example.com", "pat");
        user.energy_goal_kwh = Some(300.0);
        user
    }

    #[test]
    fn recommendations_prompt_embeds_goal_totals_and_devices() {
        let user = user_with_goal();
        let mut hvac = Device::new(&user.id, "Living room AC", DeviceType::Hvac);
        hvac.rated_power_watts = Some(1800.0);
        let records = vec![EnergyData::record(
            &hvac,
            Utc::now(),
            Measurement::consumption(12.5),
            &Pricing::new(0.2, "USD"),
        )];
        let summary = summarize(&records, None);

        let prompt = recommendations(&user, &summary, 7.0, &[hvac], &records);
        assert_eq!(prompt.kind, PromptKind::Recommendations);
        assert!(prompt.user.contains("300.0 kWh/month"));
        assert!(prompt.user.contains("Goal for this period: 70.00 kWh"));
        assert!(prompt.user.contains("Total consumption: 12.50 kWh"));
        assert!(prompt.user.contains("Living room AC (HVAC)"));
        assert!(prompt.user.contains("rated power: 1800 W"));
        assert!(prompt.system.contains("numbered list"));
    }

    #[test]
    fn device_prompt_names_category_and_rated_power() {
        let user = user_with_goal();
        let mut heater = Device::new(&user.id, "Boiler", DeviceType::WaterHeater);
        heater.rated_power_watts = Some(3000.0);
        let summary = summarize(&[], None);

        let prompt = device_optimization(&heater, &user, &summary, 7.0, &[]);
        assert!(prompt.system.contains("water heater"));
        assert!(prompt.user.contains("Category: water heater"));
        assert!(prompt.user.contains("Rated power: 3000 W"));
        assert!(prompt.user.contains("No recent readings"));
        assert_eq!(prompt.temperature, 0.5);
    }

    #[test]
    fn only_the_latest_readings_are_quoted() {
        let user = User::new("q@example.com", "quinn");
        let device = Device::new(&user.id, "TV", DeviceType::Electronics);
        let pricing = Pricing::default();
        let records: Vec<EnergyData> = (0..20)
            .map(|i| {
                EnergyData::record(
                    &device,
                    Utc::now() - chrono::Duration::hours(20 - i),
                    Measurement::consumption(i as f64),
                    &pricing,
                )
            })
            .collect();

        let lines = reading_lines(&records, USER_RECENT_READINGS, EnergyUnit::Kwh);
        assert_eq!(lines.len(), 5);
        assert!(lines[4].contains("19.00 kWh"));
    }

    #[test]
    fn wh_users_get_wh_figures() {
        let mut user = User::new("r@example.com", "rae");
        user.preferred_unit = EnergyUnit::Wh;
        let device = Device::new(&user.id, "Lamp", DeviceType::Lighting);
        let records = vec![EnergyData::record(
            &device,
            Utc::now(),
            Measurement::consumption(0.25),
            &Pricing::default(),
        )];
        let summary = summarize(&records, None);

        let prompt = pattern_analysis(&user, &summary, "week");
        assert!(prompt.user.contains("250 Wh"));
    }
}
