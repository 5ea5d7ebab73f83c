use async_trait::async_trait;
use chrono::NaiveTime;
use sqlx::FromRow;

use super::MySqlStore;
use crate::{
    error::CoreError,
    model::{
        employee::EmployeeProfile,
        work_shift::{DayKey, WorkShift},
        workplace::Workplace,
    },
    store::{EmployeeDirectory, ScheduleLookup},
};

#[derive(FromRow)]
struct ProfileRow {
    employee_id: u64,
    position_id: u64,
    workplace_id: Option<u64>,
    workplace_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<ProfileRow> for EmployeeProfile {
    fn from(row: ProfileRow) -> Self {
        let workplace = match (row.workplace_id, row.workplace_name, row.latitude, row.longitude) {
            (Some(id), Some(name), Some(latitude), Some(longitude)) => Some(Workplace {
                id,
                name,
                latitude,
                longitude,
            }),
            _ => None,
        };
        EmployeeProfile {
            employee_id: row.employee_id,
            position_id: row.position_id,
            workplace,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ShiftRow {
    pub position_id: u64,
    pub weekday: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_day_off: bool,
    pub note: Option<String>,
}

impl TryFrom<ShiftRow> for WorkShift {
    type Error = CoreError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        let weekday: DayKey = row.weekday.trim().parse().map_err(|_| {
            CoreError::Storage(format!(
                "work_shifts row for position {} has unknown weekday '{}'",
                row.position_id, row.weekday
            ))
        })?;
        Ok(WorkShift {
            position_id: row.position_id,
            weekday,
            start_time: row.start_time,
            end_time: row.end_time,
            is_day_off: row.is_day_off,
            note: row.note,
        })
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn profile(&self, employee_id: u64) -> Result<Option<EmployeeProfile>, CoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                e.id AS employee_id,
                e.position_id,
                w.id AS workplace_id,
                w.name AS workplace_name,
                w.latitude,
                w.longitude
            FROM employees e
            LEFT JOIN workplaces w ON w.id = e.workplace_id
            WHERE e.id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmployeeProfile::from))
    }
}

#[async_trait]
impl ScheduleLookup for MySqlStore {
    async fn shift_for(
        &self,
        position_id: u64,
        weekday: DayKey,
    ) -> Result<Option<WorkShift>, CoreError> {
        let row = sqlx::query_as::<_, ShiftRow>(
            r#"
            SELECT position_id, weekday, start_time, end_time, is_day_off, note
            FROM work_shifts
            WHERE position_id = ?
            AND LOWER(weekday) = ?
            "#,
        )
        .bind(position_id)
        .bind(weekday.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkShift::try_from).transpose()
    }
}
