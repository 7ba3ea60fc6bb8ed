//! Create energy_data table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users::Users;
use super::m20240101_000002_create_devices::Devices;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EnergyData::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EnergyData::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(EnergyData::DeviceId).string().not_null())
                    .col(ColumnDef::new(EnergyData::UserId).string().not_null())
                    .col(
                        ColumnDef::new(EnergyData::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnergyData::ConsumptionKwh)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(EnergyData::ProductionKwh)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(EnergyData::PowerWatts).double())
                    .col(ColumnDef::new(EnergyData::Voltage).double())
                    .col(ColumnDef::new(EnergyData::CurrentAmps).double())
                    .col(ColumnDef::new(EnergyData::TemperatureCelsius).double())
                    .col(ColumnDef::new(EnergyData::HumidityPercent).double())
                    .col(
                        ColumnDef::new(EnergyData::Cost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(EnergyData::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_energy_data_device")
                            .from(EnergyData::Table, EnergyData::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_energy_data_user")
                            .from(EnergyData::Table, EnergyData::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Range scans are always per device or per user, ordered by time.
        manager
            .create_index(
                Index::create()
                    .name("idx_energy_data_device_ts")
                    .table(EnergyData::Table)
                    .col(EnergyData::DeviceId)
                    .col(EnergyData::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_energy_data_user_ts")
                    .table(EnergyData::Table)
                    .col(EnergyData::UserId)
                    .col(EnergyData::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EnergyData::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum EnergyData {
    Table,
    Id,
    DeviceId,
    UserId,
    Timestamp,
    ConsumptionKwh,
    ProductionKwh,
    PowerWatts,
    Voltage,
    CurrentAmps,
    TemperatureCelsius,
    HumidityPercent,
    Cost,
    CreatedAt,
}
