use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    /// Also used for holidays (day-off shifts).
    Absent,
    Sick,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "07:02:11", value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,
    #[schema(example = "15:10:40", value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
    pub latitude_in: Option<f64>,
    pub longitude_in: Option<f64>,
    pub latitude_out: Option<f64>,
    pub longitude_out: Option<f64>,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub supporting_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub deleted_at: Option<NaiveDateTime>,
}

impl AttendanceRecord {
    pub fn has_checked_in(&self) -> bool {
        self.check_in_time.is_some()
    }

    pub fn has_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }
}

/// Everything needed to persist a successful check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInEntry {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub supporting_file: Option<String>,
}

/// Fields written at check-out. `note` is only overwritten when present.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutEntry {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_out_time: NaiveTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
}

/// One day of a manual sick/leave submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub stamped_at: NaiveTime,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub supporting_file: Option<String>,
}
