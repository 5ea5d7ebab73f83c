use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{FromRow, MySqlConnection};

use super::{MySqlStore, is_write_conflict};
use crate::{
    error::CoreError,
    model::attendance::{
        AttendanceRecord, AttendanceStatus, CheckInEntry, CheckOutEntry, ManualEntry,
    },
    store::AttendanceStore,
};

const RECORD_COLUMNS: &str = "id, employee_id, `date`, check_in_time, check_out_time, \
     latitude_in, longitude_in, latitude_out, longitude_out, status, note, supporting_file, \
     deleted_at";

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in_time: Option<NaiveTime>,
    check_out_time: Option<NaiveTime>,
    latitude_in: Option<f64>,
    longitude_in: Option<f64>,
    latitude_out: Option<f64>,
    longitude_out: Option<f64>,
    status: String,
    note: Option<String>,
    supporting_file: Option<String>,
    deleted_at: Option<NaiveDateTime>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = CoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status: AttendanceStatus = row.status.parse().map_err(|_| {
            CoreError::Storage(format!(
                "attendance record {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            latitude_in: row.latitude_in,
            longitude_in: row.longitude_in,
            latitude_out: row.latitude_out,
            longitude_out: row.longitude_out,
            status,
            note: row.note,
            supporting_file: row.supporting_file,
            deleted_at: row.deleted_at,
        })
    }
}

/// Locks the row for (employee, date), soft-deleted or not.
async fn lock_day(
    conn: &mut MySqlConnection,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, CoreError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records \
         WHERE employee_id = ? AND `date` = ? FOR UPDATE"
    );
    let row = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(AttendanceRecord::try_from).transpose()
}

async fn record_by_id(conn: &mut MySqlConnection, id: u64) -> Result<AttendanceRecord, CoreError> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = ?");
    let row = sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    AttendanceRecord::try_from(row)
}

/// Overwrites a soft-deleted row so the unique (employee, date) key can be reused.
async fn revive(
    conn: &mut MySqlConnection,
    id: u64,
    check_in_time: NaiveTime,
    check_out_time: Option<NaiveTime>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    status: AttendanceStatus,
    note: Option<&str>,
    supporting_file: Option<&str>,
) -> Result<(), CoreError> {
    sqlx::query(
        r#"
        UPDATE attendance_records
        SET check_in_time = ?, check_out_time = ?,
            latitude_in = ?, longitude_in = ?, latitude_out = NULL, longitude_out = NULL,
            status = ?, note = ?, supporting_file = ?, deleted_at = NULL
        WHERE id = ?
        "#,
    )
    .bind(check_in_time)
    .bind(check_out_time)
    .bind(latitude)
    .bind(longitude)
    .bind(status.as_ref())
    .bind(note)
    .bind(supporting_file)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, CoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE employee_id = ? AND `date` = ? AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn save_check_in(&self, entry: CheckInEntry) -> Result<AttendanceRecord, CoreError> {
        let mut tx = self.pool.begin().await?;

        let id = match lock_day(&mut tx, entry.employee_id, entry.date).await? {
            Some(existing) if existing.deleted_at.is_some() => {
                revive(
                    &mut tx,
                    existing.id,
                    entry.check_in_time,
                    None,
                    entry.latitude,
                    entry.longitude,
                    entry.status,
                    entry.note.as_deref(),
                    entry.supporting_file.as_deref(),
                )
                .await?;
                existing.id
            }
            Some(existing) if existing.has_checked_in() => {
                return Err(CoreError::AlreadyCheckedIn);
            }
            Some(existing) => {
                sqlx::query(
                    r#"
                    UPDATE attendance_records
                    SET check_in_time = ?, latitude_in = ?, longitude_in = ?,
                        status = ?, note = ?, supporting_file = ?
                    WHERE id = ?
                    "#,
                )
                .bind(entry.check_in_time)
                .bind(entry.latitude)
                .bind(entry.longitude)
                .bind(entry.status.as_ref())
                .bind(entry.note.as_deref())
                .bind(entry.supporting_file.as_deref())
                .bind(existing.id)
                .execute(&mut *tx)
                .await?;
                existing.id
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO attendance_records
                        (employee_id, `date`, check_in_time, latitude_in, longitude_in,
                         status, note, supporting_file)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(entry.employee_id)
                .bind(entry.date)
                .bind(entry.check_in_time)
                .bind(entry.latitude)
                .bind(entry.longitude)
                .bind(entry.status.as_ref())
                .bind(entry.note.as_deref())
                .bind(entry.supporting_file.as_deref())
                .execute(&mut *tx)
                .await;

                match result {
                    Ok(done) => done.last_insert_id(),
                    Err(e) if is_write_conflict(&e) => return Err(CoreError::AlreadyCheckedIn),
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let record = record_by_id(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn save_check_out(&self, entry: CheckOutEntry) -> Result<AttendanceRecord, CoreError> {
        let mut tx = self.pool.begin().await?;

        let existing = match lock_day(&mut tx, entry.employee_id, entry.date).await? {
            Some(record) if record.deleted_at.is_none() && record.has_checked_in() => record,
            _ => return Err(CoreError::NoCheckInYet),
        };
        if existing.has_checked_out() {
            return Err(CoreError::AlreadyCheckedOut);
        }

        sqlx::query(
            r#"
            UPDATE attendance_records
            SET check_out_time = ?, latitude_out = ?, longitude_out = ?,
                note = COALESCE(?, note)
            WHERE id = ?
            "#,
        )
        .bind(entry.check_out_time)
        .bind(entry.latitude)
        .bind(entry.longitude)
        .bind(entry.note.as_deref())
        .bind(existing.id)
        .execute(&mut *tx)
        .await?;

        let record = record_by_id(&mut tx, existing.id).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn insert_manual(
        &self,
        entries: Vec<ManualEntry>,
    ) -> Result<Vec<AttendanceRecord>, CoreError> {
        let mut tx = self.pool.begin().await?;
        let mut created_ids = Vec::with_capacity(entries.len());

        for entry in &entries {
            match lock_day(&mut tx, entry.employee_id, entry.date).await? {
                Some(existing) if existing.deleted_at.is_none() => continue,
                Some(existing) => {
                    revive(
                        &mut tx,
                        existing.id,
                        entry.stamped_at,
                        Some(entry.stamped_at),
                        None,
                        None,
                        entry.status,
                        entry.note.as_deref(),
                        entry.supporting_file.as_deref(),
                    )
                    .await?;
                    created_ids.push(existing.id);
                }
                None => {
                    let done = sqlx::query(
                        r#"
                        INSERT INTO attendance_records
                            (employee_id, `date`, check_in_time, check_out_time,
                             status, note, supporting_file)
                        VALUES (?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(entry.employee_id)
                    .bind(entry.date)
                    .bind(entry.stamped_at)
                    .bind(entry.stamped_at)
                    .bind(entry.status.as_ref())
                    .bind(entry.note.as_deref())
                    .bind(entry.supporting_file.as_deref())
                    .execute(&mut *tx)
                    .await?;
                    created_ids.push(done.last_insert_id());
                }
            }
        }

        let mut created = Vec::with_capacity(created_ids.len());
        for id in created_ids {
            created.push(record_by_id(&mut tx, id).await?);
        }

        tx.commit().await?;
        Ok(created)
    }
}
