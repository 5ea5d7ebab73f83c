//! Storage seams between the engine and its collaborators.
//!
//! Every mutating method is a single atomic read-modify-write on the backend.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::CoreError;
use crate::model::{
    activity_log::ActivityLogEntry,
    attendance::{AttendanceRecord, CheckInEntry, CheckOutEntry, ManualEntry},
    employee::EmployeeProfile,
    leave_request::{LeaveChanges, LeaveFilter, LeaveRequest, NewLeaveRequest},
    work_shift::{DayKey, WorkShift},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// Stored shift row for (position, weekday), if any.
#[async_trait]
pub trait ScheduleLookup: Send + Sync {
    async fn shift_for(
        &self,
        position_id: u64,
        weekday: DayKey,
    ) -> Result<Option<WorkShift>, CoreError>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn profile(&self, employee_id: u64) -> Result<Option<EmployeeProfile>, CoreError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, CoreError>;

    /// Creates or fills today's record. Fails with `AlreadyCheckedIn` when a
    /// concurrent check-in won.
    async fn save_check_in(&self, entry: CheckInEntry) -> Result<AttendanceRecord, CoreError>;

    /// Fails with `NoCheckInYet` or `AlreadyCheckedOut` when the stored row
    /// no longer permits a check-out.
    async fn save_check_out(&self, entry: CheckOutEntry) -> Result<AttendanceRecord, CoreError>;

    /// Inserts the entries whose dates are free, in one transaction.
    /// Returns only the records that were created.
    async fn insert_manual(
        &self,
        entries: Vec<ManualEntry>,
    ) -> Result<Vec<AttendanceRecord>, CoreError>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, request: NewLeaveRequest) -> Result<LeaveRequest, CoreError>;

    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, CoreError>;

    /// Compare-and-swap on the status column. Returns false when the stored
    /// status no longer equals `expected_status`.
    async fn update_status(
        &self,
        id: u64,
        expected_status: &str,
        next_status: &str,
        reviewer_comment: Option<&str>,
    ) -> Result<bool, CoreError>;

    async fn update_details(
        &self,
        id: u64,
        expected_status: &str,
        changes: &LeaveChanges,
    ) -> Result<bool, CoreError>;

    async fn delete(&self, id: u64, expected_status: &str) -> Result<bool, CoreError>;

    async fn list(&self, filter: &LeaveFilter) -> Result<(Vec<LeaveRequest>, i64), CoreError>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: ActivityLogEntry) -> Result<(), CoreError>;
}
