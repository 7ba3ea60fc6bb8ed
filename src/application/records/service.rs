//! Record service: application-layer orchestration for users, devices and
//! energy readings.
//!
//! Deletes cascade User → Device → EnergyData through the repository
//! provider, which runs them as one unit of work where the backend allows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::inputs::{DeletionReport, DeviceChanges, NewDevice, NewReading, NewUser, UserChanges};
use crate::domain::{
    CascadeCounts, Device, DomainError, DomainResult, EnergyData, EnergyQuery, Measurement, Pricing,
    RepositoryProvider, TimeWindow, User,
};
use crate::shared::Page;

pub struct RecordService {
    repos: Arc<dyn RepositoryProvider>,
    pricing: Pricing,
}

fn check_goal(goal_kwh: Option<f64>, savings_percent: Option<f64>) -> DomainResult<()> {
    if goal_kwh.is_some_and(|g| !g.is_finite() || g < 0.0) {
        return Err(DomainError::Validation(
            "energy_goal_kwh must be a non-negative number".into(),
        ));
    }
    if savings_percent.is_some_and(|p| !(0.0..=100.0).contains(&p)) {
        return Err(DomainError::Validation(
            "savings_target_percent must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

fn check_rated_power(watts: Option<f64>) -> DomainResult<()> {
    if watts.is_some_and(|w| !w.is_finite() || w < 0.0) {
        return Err(DomainError::Validation(
            "rated_power_watts must be a non-negative number".into(),
        ));
    }
    Ok(())
}

impl RecordService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, pricing: Pricing) -> Self {
        Self { repos, pricing }
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    // ── Users ───────────────────────────────────────────────────

    /// Email and username must not belong to another user than `owner`.
    async fn ensure_unique(
        &self,
        owner: Option<&str>,
        email: Option<&str>,
        username: Option<&str>,
    ) -> DomainResult<()> {
        let taken = |found: Option<User>| found.is_some_and(|u| Some(u.id.as_str()) != owner);

        if let Some(email) = email {
            if taken(self.repos.users().find_by_email(email).await?) {
                return Err(DomainError::Conflict(format!("Email {} is already registered", email)));
            }
        }
        if let Some(username) = username {
            if taken(self.repos.users().find_by_username(username).await?) {
                return Err(DomainError::Conflict(format!("Username {} is already taken", username)));
            }
        }
        Ok(())
    }

    pub async fn create_user(&self, input: NewUser) -> DomainResult<User> {
        check_goal(input.energy_goal_kwh, input.savings_target_percent)?;

        self.ensure_unique(None, Some(&input.email), Some(&input.username))
            .await?;

        let mut user = User::new(input.email, input.username);
        user.full_name = input.full_name;
        user.energy_goal_kwh = input.energy_goal_kwh;
        user.savings_target_percent = input.savings_target_percent;
        user.preferred_temperature_celsius = input.preferred_temperature_celsius;
        if let Some(unit) = input.preferred_unit {
            user.preferred_unit = unit;
        }

        let user = self.repos.users().save(user).await?;
        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn list_users(&self, page: Page) -> DomainResult<Vec<User>> {
        self.repos.users().find_all(page).await
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn update_user(&self, id: &str, changes: UserChanges) -> DomainResult<User> {
        check_goal(changes.energy_goal_kwh, changes.savings_target_percent)?;
        let mut user = self.get_user(id).await?;

        self.ensure_unique(
            Some(&user.id),
            changes.email.as_deref(),
            changes.username.as_deref(),
        )
        .await?;

        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.username {
            user.username = v;
        }
        if let Some(v) = changes.full_name {
            user.full_name = Some(v);
        }
        if let Some(v) = changes.is_active {
            user.is_active = v;
        }
        if let Some(v) = changes.energy_goal_kwh {
            user.energy_goal_kwh = Some(v);
        }
        if let Some(v) = changes.savings_target_percent {
            user.savings_target_percent = Some(v);
        }
        if let Some(v) = changes.preferred_temperature_celsius {
            user.preferred_temperature_celsius = Some(v);
        }
        if let Some(v) = changes.preferred_unit {
            user.preferred_unit = v;
        }
        user.updated_at = Utc::now();

        self.repos.users().update(user).await
    }

    pub async fn delete_user(&self, id: &str) -> DomainResult<DeletionReport> {
        self.get_user(id).await?;

        let CascadeCounts {
            devices,
            energy_records,
        } = self.repos.delete_user_cascade(id).await?;

        info!(user_id = %id, devices, energy_records, "User deleted with dependants");
        Ok(DeletionReport {
            devices,
            energy_records,
        })
    }

    // ── Devices ─────────────────────────────────────────────────

    pub async fn add_device(&self, user_id: &str, input: NewDevice) -> DomainResult<Device> {
        check_rated_power(input.rated_power_watts)?;
        self.get_user(user_id).await?;

        let mut device = Device::new(user_id, input.name, input.device_type);
        device.model = input.model;
        device.manufacturer = input.manufacturer;
        device.location = input.location;
        device.rated_power_watts = input.rated_power_watts;
        device.is_smart_device = input.is_smart_device;

        let device = self.repos.devices().save(device).await?;
        info!(device_id = %device.id, user_id = %user_id, kind = %device.device_type, "Device added");
        Ok(device)
    }

    pub async fn list_devices(&self, user_id: &str, page: Page) -> DomainResult<Vec<Device>> {
        self.get_user(user_id).await?;
        self.repos.devices().find_by_user(user_id, page).await
    }

    /// Every device of the user, for analytics.
    pub async fn all_devices(&self, user_id: &str) -> DomainResult<Vec<Device>> {
        self.repos
            .devices()
            .find_by_user(user_id, Page::new(None, Some(Page::MAX_LIMIT)))
            .await
    }

    pub async fn get_device(&self, id: &str) -> DomainResult<Device> {
        self.repos
            .devices()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Device", id))
    }

    pub async fn update_device(&self, id: &str, changes: DeviceChanges) -> DomainResult<Device> {
        check_rated_power(changes.rated_power_watts)?;
        let mut device = self.get_device(id).await?;

        if let Some(v) = changes.name {
            device.name = v;
        }
        if let Some(v) = changes.device_type {
            device.device_type = v;
        }
        if let Some(v) = changes.model {
            device.model = Some(v);
        }
        if let Some(v) = changes.manufacturer {
            device.manufacturer = Some(v);
        }
        if let Some(v) = changes.location {
            device.location = Some(v);
        }
        if let Some(v) = changes.rated_power_watts {
            device.rated_power_watts = Some(v);
        }
        if let Some(v) = changes.is_smart_device {
            device.is_smart_device = v;
        }
        if let Some(v) = changes.is_active {
            device.is_active = v;
        }
        device.updated_at = Utc::now();

        self.repos.devices().update(device).await
    }

    /// Returns the number of readings removed with the device.
    pub async fn delete_device(&self, id: &str) -> DomainResult<u64> {
        self.get_device(id).await?;

        let removed = self.repos.delete_device_cascade(id).await?;

        info!(device_id = %id, energy_records = removed, "Device deleted with readings");
        Ok(removed)
    }

    // ── Energy readings ─────────────────────────────────────────

    pub async fn record_energy(&self, device_id: &str, input: NewReading) -> DomainResult<EnergyData> {
        input.measurement.validate()?;
        let device = self.get_device(device_id).await?;

        let timestamp = input.timestamp.unwrap_or_else(Utc::now);
        let data = EnergyData::record(&device, timestamp, input.measurement, &self.pricing);
        let data = self.repos.energy_data().save(data).await?;
        self.repos.devices().touch_last_seen(device_id, timestamp).await?;

        info!(
            device_id = %device_id,
            consumption_kwh = data.consumption_kwh,
            cost = data.cost,
            "Energy reading recorded"
        );
        Ok(data)
    }

    /// Replace the measured values of a reading; the cost follows.
    pub async fn correct_energy(&self, record_id: &str, measurement: Measurement) -> DomainResult<EnergyData> {
        measurement.validate()?;
        let mut data = self
            .repos
            .energy_data()
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| DomainError::not_found("EnergyData", record_id))?;

        data.apply(measurement, &self.pricing);
        let data = self.repos.energy_data().update(data).await?;
        info!(record_id = %record_id, cost = data.cost, "Energy reading corrected");
        Ok(data)
    }

    pub async fn device_readings(
        &self,
        device_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        page: Option<Page>,
    ) -> DomainResult<Vec<EnergyData>> {
        check_bounds(start, end)?;
        self.get_device(device_id).await?;
        let mut query = EnergyQuery::for_device(device_id).between(start, end);
        query.page = page;
        self.repos.energy_data().find(query).await
    }

    pub async fn user_readings(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        page: Option<Page>,
    ) -> DomainResult<Vec<EnergyData>> {
        check_bounds(start, end)?;
        self.get_user(user_id).await?;
        let mut query = EnergyQuery::for_user(user_id).between(start, end);
        query.page = page;
        self.repos.energy_data().find(query).await
    }
}

fn check_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> DomainResult<()> {
    if let (Some(s), Some(e)) = (start, end) {
        TimeWindow::new(s, e)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceType;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::Duration;

    fn service() -> RecordService {
        RecordService::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            Pricing::new(0.2, "USD"),
        )
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            email: format!("{}@example.com", name),
            username: name.to_string(),
            ..NewUser::default()
        }
    }

    fn new_device(name: &str) -> NewDevice {
        NewDevice {
            name: name.to_string(),
            device_type: DeviceType::Appliance,
            model: None,
            manufacturer: None,
            location: Some("Kitchen".into()),
            rated_power_watts: Some(150.0),
            is_smart_device: false,
        }
    }

    fn reading(kwh: f64, at: DateTime<Utc>) -> NewReading {
        NewReading {
            timestamp: Some(at),
            measurement: Measurement::consumption(kwh),
        }
    }

    #[tokio::test]
    async fn duplicate_user_is_a_conflict() {
        let svc = service();
        svc.create_user(new_user("alice")).await.unwrap();

        let err = svc.create_user(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn device_for_unknown_user_is_not_found() {
        let err = service().add_device("missing", new_device("Fridge")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "User", .. }));
    }

    #[tokio::test]
    async fn recording_prices_reading_and_touches_device() {
        let svc = service();
        let user = svc.create_user(new_user("bob")).await.unwrap();
        let device = svc.add_device(&user.id, new_device("Fridge")).await.unwrap();
        let at = Utc::now() - Duration::hours(1);

        let data = svc.record_energy(&device.id, reading(10.0, at)).await.unwrap();
        assert_eq!(data.cost, 2.0);
        assert_eq!(data.user_id, user.id);

        let device = svc.get_device(&device.id).await.unwrap();
        assert_eq!(device.last_seen, Some(at));
    }

    #[tokio::test]
    async fn negative_reading_is_rejected() {
        let svc = service();
        let user = svc.create_user(new_user("carol")).await.unwrap();
        let device = svc.add_device(&user.id, new_device("Dryer")).await.unwrap();

        let err = svc
            .record_energy(&device.id, reading(-3.0, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn readings_that_would_overflow_totals_are_rejected() {
        let svc = service();
        let user = svc.create_user(new_user("erin")).await.unwrap();
        let device = svc.add_device(&user.id, new_device("Kiln")).await.unwrap();

        for kwh in [5e28, 1e30] {
            let err = svc
                .record_energy(&device.id, reading(kwh, Utc::now()))
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }

        let data = svc.record_energy(&device.id, reading(1.0, Utc::now())).await.unwrap();
        let err = svc
            .correct_energy(&data.id, Measurement::consumption(1e30))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn correction_recomputes_cost() {
        let svc = service();
        let user = svc.create_user(new_user("dave")).await.unwrap();
        let device = svc.add_device(&user.id, new_device("Oven")).await.unwrap();
        let data = svc.record_energy(&device.id, reading(1.0, Utc::now())).await.unwrap();

        let fixed = svc
            .correct_energy(&data.id, Measurement::consumption(5.0))
            .await
            .unwrap();
        assert_eq!(fixed.cost, 1.0);
        assert_eq!(fixed.timestamp, data.timestamp);
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_devices_and_readings() {
        let svc = service();
        let user = svc.create_user(new_user("erin")).await.unwrap();
        let other = svc.create_user(new_user("frank")).await.unwrap();
        let d1 = svc.add_device(&user.id, new_device("AC")).await.unwrap();
        let d2 = svc.add_device(&user.id, new_device("TV")).await.unwrap();
        let kept = svc.add_device(&other.id, new_device("Lamp")).await.unwrap();
        for d in [&d1, &d2, &kept] {
            svc.record_energy(&d.id, reading(1.0, Utc::now())).await.unwrap();
        }

        let report = svc.delete_user(&user.id).await.unwrap();
        assert_eq!(report, DeletionReport { devices: 2, energy_records: 2 });

        assert!(svc.get_user(&user.id).await.is_err());
        assert!(svc.get_device(&d1.id).await.is_err());
        let remaining = svc.user_readings(&other.id, None, None, None).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn deleting_device_removes_its_readings() {
        let svc = service();
        let user = svc.create_user(new_user("gina")).await.unwrap();
        let device = svc.add_device(&user.id, new_device("Heater")).await.unwrap();
        svc.record_energy(&device.id, reading(2.0, Utc::now())).await.unwrap();
        svc.record_energy(&device.id, reading(3.0, Utc::now())).await.unwrap();

        assert_eq!(svc.delete_device(&device.id).await.unwrap(), 2);
        let left = svc.user_readings(&user.id, None, None, None).await.unwrap();
        assert!(left.is_empty());
    }

    #[tokio::test]
    async fn readings_reject_inverted_range() {
        let svc = service();
        let user = svc.create_user(new_user("hank")).await.unwrap();
        let now = Utc::now();

        let err = svc
            .user_readings(&user.id, Some(now), Some(now - Duration::days(1)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn update_rejects_taken_username() {
        let svc = service();
        let a = svc.create_user(new_user("ivy")).await.unwrap();
        svc.create_user(new_user("jack")).await.unwrap();

        let err = svc
            .update_user(
                &a.id,
                UserChanges {
                    username: Some("jack".into()),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let updated = svc
            .update_user(
                &a.id,
                UserChanges {
                    energy_goal_kwh: Some(250.0),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.energy_goal_kwh, Some(250.0));
    }
}
