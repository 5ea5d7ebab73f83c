use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Leave types accepted at submission. Stored as the lowercase display string.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum LeaveType {
    #[strum(to_string = "cuti tahunan")]
    Tahunan,
    #[strum(to_string = "cuti sakit")]
    Sakit,
    #[strum(to_string = "cuti melahirkan")]
    Melahirkan,
    #[strum(to_string = "cuti alasan penting")]
    AlasanPenting,
    #[strum(to_string = "cuti besar")]
    Besar,
    #[strum(to_string = "cuti di luar tanggungan")]
    DiLuarTanggungan,
}

impl LeaveType {
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }
}

/// Only annual leave is routed on to the director of education.
pub fn is_annual_leave(leave_type: &str) -> bool {
    leave_type.trim().eq_ignore_ascii_case(LeaveType::Tahunan.as_ref())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "cuti tahunan")]
    pub leave_type: String,
    #[schema(example = "ditinjau kepala sekolah")]
    pub status: String,
    pub reason: String,
    pub supporting_file: Option<String>,
    pub reviewer_comment: Option<String>,
    #[schema(example = "2026-01-01T08:00:00", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<NaiveDateTime>,
    #[schema(example = "2026-01-01T08:00:00", format = "date-time", value_type = Option<String>)]
    pub updated_at: Option<NaiveDateTime>,
}

/// A validated submission, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
    pub status: String,
    pub reason: String,
    pub supporting_file: Option<String>,
}

/// Employee edits; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveChanges {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub leave_type: Option<LeaveType>,
    pub reason: Option<String>,
    pub supporting_file: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<String>,
    pub page: u64,
    pub per_page: u64,
}

impl LeaveFilter {
    /// Row offset of the requested page; saturates instead of overflowing.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_types_are_case_insensitive() {
        assert_eq!(LeaveType::parse(" Cuti Tahunan "), Some(LeaveType::Tahunan));
        assert_eq!(LeaveType::parse("CUTI SAKIT"), Some(LeaveType::Sakit));
        assert_eq!(LeaveType::parse("liburan"), None);
    }

    #[test]
    fn offset_saturates_on_huge_pages() {
        let filter = |page| LeaveFilter {
            page,
            per_page: 10,
            ..Default::default()
        };
        assert_eq!(filter(0).offset(), 0);
        assert_eq!(filter(3).offset(), 20);
        assert_eq!(filter(u64::MAX).offset(), u64::MAX);
    }

    #[test]
    fn only_cuti_tahunan_is_annual() {
        assert!(is_annual_leave("cuti tahunan"));
        assert!(is_annual_leave("CUTI TAHUNAN"));
        assert!(!is_annual_leave("cuti sakit"));
        assert!(!is_annual_leave("cuti besar"));
    }
}
