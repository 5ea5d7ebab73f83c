//! In-process store used by unit and HTTP tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::CoreError,
    model::{
        activity_log::ActivityLogEntry,
        attendance::{AttendanceRecord, CheckInEntry, CheckOutEntry, ManualEntry},
        employee::EmployeeProfile,
        leave_request::{LeaveChanges, LeaveFilter, LeaveRequest, NewLeaveRequest},
        work_shift::{DayKey, WorkShift},
    },
    store::{AttendanceStore, AuditSink, EmployeeDirectory, LeaveStore, ScheduleLookup},
};

#[derive(Default)]
struct Inner {
    employees: HashMap<u64, EmployeeProfile>,
    shifts: HashMap<(u64, DayKey), WorkShift>,
    attendance: BTreeMap<u64, AttendanceRecord>,
    leaves: BTreeMap<u64, LeaveRequest>,
    audit: Vec<ActivityLogEntry>,
    next_id: u64,
    /// Status written by a simulated competing reviewer on the next CAS.
    racing_status: Option<String>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn live_record_mut(&mut self, employee_id: u64, date: NaiveDate) -> Option<&mut AttendanceRecord> {
        self.attendance
            .values_mut()
            .find(|r| r.employee_id == employee_id && r.date == date && r.deleted_at.is_none())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn add_employee(&self, profile: EmployeeProfile) {
        let mut inner = self.inner.lock().unwrap();
        inner.employees.insert(profile.employee_id, profile);
    }

    pub fn add_shift(&self, shift: WorkShift) {
        let mut inner = self.inner.lock().unwrap();
        inner.shifts.insert((shift.position_id, shift.weekday), shift);
    }

    pub fn attendance_for(&self, employee_id: u64, date: NaiveDate) -> Option<AttendanceRecord> {
        let mut inner = self.inner.lock().unwrap();
        inner.live_record_mut(employee_id, date).cloned()
    }

    pub fn leave(&self, id: u64) -> Option<LeaveRequest> {
        self.inner.lock().unwrap().leaves.get(&id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<ActivityLogEntry> {
        self.inner.lock().unwrap().audit.clone()
    }

    pub fn race_next_status_update(&self, status: &str) {
        self.inner.lock().unwrap().racing_status = Some(status.to_string());
    }
}

#[async_trait]
impl ScheduleLookup for MemoryStore {
    async fn shift_for(
        &self,
        position_id: u64,
        weekday: DayKey,
    ) -> Result<Option<WorkShift>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.shifts.get(&(position_id, weekday)).cloned())
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn profile(&self, employee_id: u64) -> Result<Option<EmployeeProfile>, CoreError> {
        Ok(self.inner.lock().unwrap().employees.get(&employee_id).cloned())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, CoreError> {
        Ok(self.attendance_for(employee_id, date))
    }

    async fn save_check_in(&self, entry: CheckInEntry) -> Result<AttendanceRecord, CoreError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(record) = inner.live_record_mut(entry.employee_id, entry.date) {
            if record.has_checked_in() {
                return Err(CoreError::AlreadyCheckedIn);
            }
            record.check_in_time = Some(entry.check_in_time);
            record.latitude_in = entry.latitude;
            record.longitude_in = entry.longitude;
            record.status = entry.status;
            record.note = entry.note;
            record.supporting_file = entry.supporting_file;
            return Ok(record.clone());
        }

        let id = inner.next_id();
        let record = AttendanceRecord {
            id,
            employee_id: entry.employee_id,
            date: entry.date,
            check_in_time: Some(entry.check_in_time),
            check_out_time: None,
            latitude_in: entry.latitude,
            longitude_in: entry.longitude,
            latitude_out: None,
            longitude_out: None,
            status: entry.status,
            note: entry.note,
            supporting_file: entry.supporting_file,
            deleted_at: None,
        };
        inner.attendance.insert(id, record.clone());
        Ok(record)
    }

    async fn save_check_out(&self, entry: CheckOutEntry) -> Result<AttendanceRecord, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = match inner.live_record_mut(entry.employee_id, entry.date) {
            Some(record) if record.has_checked_in() => record,
            _ => return Err(CoreError::NoCheckInYet),
        };
        if record.has_checked_out() {
            return Err(CoreError::AlreadyCheckedOut);
        }

        record.check_out_time = Some(entry.check_out_time);
        record.latitude_out = entry.latitude;
        record.longitude_out = entry.longitude;
        if entry.note.is_some() {
            record.note = entry.note;
        }
        Ok(record.clone())
    }

    async fn insert_manual(
        &self,
        entries: Vec<ManualEntry>,
    ) -> Result<Vec<AttendanceRecord>, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut created = Vec::new();

        for entry in entries {
            if inner.live_record_mut(entry.employee_id, entry.date).is_some() {
                continue;
            }
            let id = inner.next_id();
            let record = AttendanceRecord {
                id,
                employee_id: entry.employee_id,
                date: entry.date,
                check_in_time: Some(entry.stamped_at),
                check_out_time: Some(entry.stamped_at),
                latitude_in: None,
                longitude_in: None,
                latitude_out: None,
                longitude_out: None,
                status: entry.status,
                note: entry.note,
                supporting_file: entry.supporting_file,
                deleted_at: None,
            };
            inner.attendance.insert(id, record.clone());
            created.push(record);
        }

        Ok(created)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert(&self, request: NewLeaveRequest) -> Result<LeaveRequest, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let leave = LeaveRequest {
            id,
            employee_id: request.employee_id,
            start_date: request.start_date,
            end_date: request.end_date,
            leave_type: request.leave_type.to_string(),
            status: request.status,
            reason: request.reason,
            supporting_file: request.supporting_file,
            reviewer_comment: None,
            created_at: None,
            updated_at: None,
        };
        inner.leaves.insert(id, leave.clone());
        Ok(leave)
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, CoreError> {
        Ok(self.leave(id))
    }

    async fn update_status(
        &self,
        id: u64,
        expected_status: &str,
        next_status: &str,
        reviewer_comment: Option<&str>,
    ) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let racing = inner.racing_status.take();
        let Some(leave) = inner.leaves.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(status) = racing {
            leave.status = status;
        }
        if leave.status != expected_status {
            return Ok(false);
        }
        leave.status = next_status.to_string();
        if let Some(comment) = reviewer_comment {
            leave.reviewer_comment = Some(comment.to_string());
        }
        Ok(true)
    }

    async fn update_details(
        &self,
        id: u64,
        expected_status: &str,
        changes: &LeaveChanges,
    ) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(leave) = inner.leaves.get_mut(&id) else {
            return Ok(false);
        };
        if leave.status != expected_status {
            return Ok(false);
        }
        if let Some(start) = changes.start_date {
            leave.start_date = start;
        }
        if let Some(end) = changes.end_date {
            leave.end_date = end;
        }
        if let Some(leave_type) = changes.leave_type {
            leave.leave_type = leave_type.to_string();
        }
        if let Some(reason) = &changes.reason {
            leave.reason = reason.clone();
        }
        if let Some(file) = &changes.supporting_file {
            leave.supporting_file = Some(file.clone());
        }
        Ok(true)
    }

    async fn delete(&self, id: u64, expected_status: &str) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.leaves.get(&id) {
            Some(leave) if leave.status == expected_status => {
                inner.leaves.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<(Vec<LeaveRequest>, i64), CoreError> {
        let inner = self.inner.lock().unwrap();
        let matching: Vec<LeaveRequest> = inner
            .leaves
            .values()
            .rev()
            .filter(|l| filter.employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| filter.status.as_deref().is_none_or(|s| l.status == s))
            .cloned()
            .collect();

        let total = matching.len() as i64;
        let offset = filter.offset();
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(filter.per_page as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record(&self, entry: ActivityLogEntry) -> Result<(), CoreError> {
        self.inner.lock().unwrap().audit.push(entry);
        Ok(())
    }
}
