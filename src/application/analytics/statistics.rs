//! Statistics aggregation
//!
//! Reduces energy readings to totals and a per-day breakdown. Sums are
//! accumulated as `Decimal`; days are UTC calendar dates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{EnergyData, TimeWindow};
use crate::shared::{round_f64, to_decimal, to_f64};

/// Sub-summary for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub consumption_kwh: f64,
    pub production_kwh: f64,
    pub net_energy_kwh: f64,
    pub cost: f64,
    pub record_count: u64,
    pub average_power_watts: Option<f64>,
    pub peak_power_watts: Option<f64>,
    pub average_temperature_celsius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySummary {
    /// Window bounds, or the first/last reading when no window was given.
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub total_consumption_kwh: f64,
    pub total_production_kwh: f64,
    /// Consumption minus production.
    pub net_energy_kwh: f64,
    pub total_cost: f64,
    pub record_count: u64,
    /// Distinct devices that contributed readings.
    pub device_count: u64,
    /// Consumption per reading, 0 when there are none.
    pub average_consumption_kwh: f64,
    pub average_power_watts: Option<f64>,
    pub peak_power_watts: Option<f64>,
    pub daily: Vec<DailyStats>,
}

impl EnergySummary {
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Average consumption per day that has readings.
    pub fn average_daily_consumption_kwh(&self) -> f64 {
        if self.daily.is_empty() {
            return 0.0;
        }
        let total = self
            .daily
            .iter()
            .fold(Decimal::ZERO, |acc, d| acc.saturating_add(to_decimal(d.consumption_kwh)));
        round_f64(total / Decimal::from(self.daily.len() as u64), 3)
    }

    /// Day with the highest consumption.
    pub fn peak_day(&self) -> Option<&DailyStats> {
        self.daily
            .iter()
            .max_by(|a, b| a.consumption_kwh.total_cmp(&b.consumption_kwh))
    }
}

#[derive(Debug, Default, Clone)]
struct Totals {
    consumption: Decimal,
    production: Decimal,
    cost: Decimal,
    count: u64,
    power_sum: Decimal,
    power_count: u64,
    peak_power: Option<f64>,
    temperature_sum: Decimal,
    temperature_count: u64,
}

// Sums saturate at `Decimal::MAX` instead of panicking on rows that
// predate the measurement bounds.
impl Totals {
    fn add(&mut self, r: &EnergyData) {
        self.consumption = self.consumption.saturating_add(to_decimal(r.consumption_kwh));
        self.production = self.production.saturating_add(to_decimal(r.production_kwh));
        self.cost = self.cost.saturating_add(to_decimal(r.cost));
        self.count += 1;

        if let Some(p) = r.power_watts {
            self.power_sum = self.power_sum.saturating_add(to_decimal(p));
            self.power_count += 1;
            self.peak_power = Some(self.peak_power.map_or(p, |peak| peak.max(p)));
        }
        if let Some(t) = r.temperature_celsius {
            self.temperature_sum = self.temperature_sum.saturating_add(to_decimal(t));
            self.temperature_count += 1;
        }
    }

    fn average_power(&self) -> Option<f64> {
        mean(self.power_sum, self.power_count)
    }

    fn average_temperature(&self) -> Option<f64> {
        mean(self.temperature_sum, self.temperature_count)
    }

    fn into_daily(self, date: NaiveDate) -> DailyStats {
        DailyStats {
            date,
            consumption_kwh: to_f64(self.consumption),
            production_kwh: to_f64(self.production),
            net_energy_kwh: to_f64(self.consumption.saturating_sub(self.production)),
            cost: to_f64(self.cost),
            record_count: self.count,
            average_power_watts: self.average_power(),
            peak_power_watts: self.peak_power,
            average_temperature_celsius: self.average_temperature(),
        }
    }
}

fn mean(sum: Decimal, count: u64) -> Option<f64> {
    (count > 0).then(|| round_f64(sum / Decimal::from(count), 3))
}

fn bucket_key(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Summarise `records`, keeping only those inside `window` when one is given.
pub fn summarize(records: &[EnergyData], window: Option<&TimeWindow>) -> EnergySummary {
    let selected: Vec<&EnergyData> = records
        .iter()
        .filter(|r| window.map_or(true, |w| w.contains(r.timestamp)))
        .collect();

    let mut totals = Totals::default();
    let mut days: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    let mut devices: BTreeSet<&str> = BTreeSet::new();

    for r in &selected {
        totals.add(r);
        days.entry(bucket_key(r.timestamp)).or_default().add(r);
        devices.insert(r.device_id.as_str());
    }

    let (period_start, period_end) = match window {
        Some(w) => (Some(w.start), Some(w.end)),
        None => (
            selected.iter().map(|r| r.timestamp).min(),
            selected.iter().map(|r| r.timestamp).max(),
        ),
    };

    let average_consumption = if totals.count > 0 {
        round_f64(totals.consumption / Decimal::from(totals.count), 3)
    } else {
        0.0
    };

    EnergySummary {
        period_start,
        period_end,
        total_consumption_kwh: to_f64(totals.consumption),
        total_production_kwh: to_f64(totals.production),
        net_energy_kwh: to_f64(totals.consumption.saturating_sub(totals.production)),
        total_cost: to_f64(totals.cost),
        record_count: totals.count,
        device_count: devices.len() as u64,
        average_consumption_kwh: average_consumption,
        average_power_watts: totals.average_power(),
        peak_power_watts: totals.peak_power,
        daily: days
            .into_iter()
            .map(|(date, t)| t.into_daily(date))
            .collect(),
    }
}

/// One entry per UTC date in `window`, zero-filled where there is no data.
pub fn daily_series(records: &[EnergyData], window: &TimeWindow) -> Vec<DailyStats> {
    let summary = summarize(records, Some(window));
    let mut by_date: BTreeMap<NaiveDate, DailyStats> =
        summary.daily.into_iter().map(|d| (d.date, d)).collect();

    window
        .dates()
        .into_iter()
        .map(|date| {
            by_date
                .remove(&date)
                .unwrap_or_else(|| Totals::default().into_daily(date))
        })
        .collect()
}
