//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit used when rendering energy amounts back to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyUnit {
    #[default]
    Kwh,
    Wh,
}

impl EnergyUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyUnit::Kwh => "kwh",
            EnergyUnit::Wh => "wh",
        }
    }

    /// Render an amount stored in kWh.
    pub fn format(&self, kwh: f64) -> String {
        match self {
            EnergyUnit::Kwh => format!("{:.2} kWh", kwh),
            EnergyUnit::Wh => format!("{:.0} Wh", kwh * 1000.0),
        }
    }
}

impl std::fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnergyUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kwh" => Ok(EnergyUnit::Kwh),
            "wh" => Ok(EnergyUnit::Wh),
            other => Err(format!("unknown energy unit '{}'", other)),
        }
    }
}

/// What the user is aiming for. Either part may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyGoal {
    /// Target consumption per 30-day month.
    pub monthly_kwh: Option<f64>,
    /// Desired reduction relative to the previous period.
    pub savings_percent: Option<f64>,
}

impl EnergyGoal {
    pub const DAYS_PER_MONTH: f64 = 30.0;

    pub fn is_set(&self) -> bool {
        self.monthly_kwh.is_some() || self.savings_percent.is_some()
    }

    /// Monthly target scaled to a window of `days` days.
    pub fn target_for_days(&self, days: f64) -> Option<f64> {
        self.monthly_kwh
            .filter(|_| days > 0.0)
            .map(|goal| goal * days / Self::DAYS_PER_MONTH)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub energy_goal_kwh: Option<f64>,
    pub savings_target_percent: Option<f64>,
    pub preferred_temperature_celsius: Option<f64>,
    pub preferred_unit: EnergyUnit,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            username: username.into(),
            full_name: None,
            is_active: true,
            energy_goal_kwh: None,
            savings_target_percent: None,
            preferred_temperature_celsius: None,
            preferred_unit: EnergyUnit::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn goal(&self) -> EnergyGoal {
        EnergyGoal {
            monthly_kwh: self.energy_goal_kwh,
            savings_percent: self.savings_target_percent,
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_is_prorated_to_window() {
        let mut user = User::new("a@example.com", "alice");
        user.energy_goal_kwh = Some(300.0);

        assert_eq!(user.goal().target_for_days(7.0), Some(70.0));
        assert_eq!(user.goal().target_for_days(0.0), None);
    }

    #[test]
    fn unset_goal() {
        let user = User::new("a@example.com", "alice");
        assert!(!user.goal().is_set());
        assert_eq!(user.goal().target_for_days(30.0), None);
    }

    #[test]
    fn unit_formatting() {
        assert_eq!(EnergyUnit::Kwh.format(1.5), "1.50 kWh");
        assert_eq!(EnergyUnit::Wh.format(1.5), "1500 Wh");
        assert_eq!("WH".parse::<EnergyUnit>().unwrap(), EnergyUnit::Wh);
    }
}
