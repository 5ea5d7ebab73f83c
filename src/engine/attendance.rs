//! Check-in/check-out status decisions and manual absence marking.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    engine::{
        Actor,
        geofence::{self, CHECK_IN_RADIUS_METERS, CHECK_OUT_RADIUS_METERS, Coordinates},
        schedule::resolve_shift,
    },
    error::{CoreError, LocationOutOfRange},
    model::{
        activity_log::{ActivityLogEntry, SubjectType},
        attendance::{AttendanceRecord, AttendanceStatus, CheckInEntry, CheckOutEntry, ManualEntry},
        employee::EmployeeProfile,
        work_shift::WorkShift,
        workplace::Workplace,
    },
    store::{AttendanceStore, AuditSink, EmployeeDirectory, ScheduleLookup},
};

/// Grace period after the shift start before a check-in counts as late.
pub const LATE_TOLERANCE_MINUTES: i64 = 15;

pub const HOLIDAY_NOTE: &str = "Hari libur";

/// Longest date range, in days, one manual sick/leave entry may cover.
pub const MAX_ABSENCE_DAYS: i64 = 366;

/// What to do when a workplace is registered but no position was reported.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LocationMode {
    /// Record the workplace coordinates as the reported position.
    TrustDefaultLocation,
    /// Leave the position empty and skip the geofence.
    SkipWhenMissing,
}

impl LocationMode {
    pub fn from_flag(trust_default_location: bool) -> Self {
        if trust_default_location {
            LocationMode::TrustDefaultLocation
        } else {
            LocationMode::SkipWhenMissing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GeofenceOutcome {
    Verified {
        distance_meters: f64,
        radius_meters: f64,
    },
    TrustedDefault,
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusDecision {
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub is_day_off: bool,
}

/// Decides the check-in status from the shift that applies today.
pub fn decide_status(
    shift: Option<&WorkShift>,
    check_in: NaiveTime,
    note: Option<String>,
) -> StatusDecision {
    let Some(shift) = shift else {
        return StatusDecision {
            status: AttendanceStatus::Present,
            note,
            is_day_off: false,
        };
    };

    if shift.is_day_off {
        return StatusDecision {
            status: AttendanceStatus::Absent,
            note: Some(HOLIDAY_NOTE.to_string()),
            is_day_off: true,
        };
    }

    if let Some(start) = shift.start_time {
        let tolerance = start + Duration::minutes(LATE_TOLERANCE_MINUTES);
        if check_in > tolerance {
            let note = note.unwrap_or_else(|| late_note(check_in - start));
            return StatusDecision {
                status: AttendanceStatus::Late,
                note: Some(note),
                is_day_off: false,
            };
        }
    }

    StatusDecision {
        status: AttendanceStatus::Present,
        note,
        is_day_off: false,
    }
}

/// "Terlambat 1 jam 5 menit", "Terlambat 20 menit".
pub fn late_note(late_by: Duration) -> String {
    let minutes = late_by.num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, m) => format!("Terlambat {m} menit"),
        (h, 0) => format!("Terlambat {h} jam"),
        (h, m) => format!("Terlambat {h} jam {m} menit"),
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceKind {
    Sick,
    Leave,
}

impl AbsenceKind {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_lowercase().as_str() {
            "sakit" | "sick" => Ok(AbsenceKind::Sick),
            "izin" | "cuti" | "leave" => Ok(AbsenceKind::Leave),
            other => Err(CoreError::validation(format!(
                "Invalid absence kind '{other}'. Allowed: sakit, izin"
            ))),
        }
    }

    fn status(self) -> AttendanceStatus {
        match self {
            AbsenceKind::Sick => AttendanceStatus::Sick,
            AbsenceKind::Leave => AttendanceStatus::Leave,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckInRequest {
    pub employee_id: u64,
    pub now: NaiveDateTime,
    pub coordinates: Option<Coordinates>,
    pub note: Option<String>,
    pub supporting_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckOutRequest {
    pub employee_id: u64,
    pub now: NaiveDateTime,
    pub coordinates: Option<Coordinates>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AbsenceRequest {
    pub employee_id: u64,
    pub kind: AbsenceKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub note: Option<String>,
    pub supporting_file: Option<String>,
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceOutcome {
    pub record: AttendanceRecord,
    pub geofence: GeofenceOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AbsenceReport {
    #[schema(example = 3)]
    pub created: usize,
    #[schema(example = 1)]
    pub skipped: usize,
    #[schema(value_type = Vec<String>)]
    pub created_dates: Vec<NaiveDate>,
    #[schema(value_type = Vec<String>)]
    pub skipped_dates: Vec<NaiveDate>,
}

pub struct AttendanceEngine {
    schedules: Arc<dyn ScheduleLookup>,
    employees: Arc<dyn EmployeeDirectory>,
    records: Arc<dyn AttendanceStore>,
    audit: Arc<dyn AuditSink>,
    location_mode: LocationMode,
}

impl AttendanceEngine {
    pub fn new(
        schedules: Arc<dyn ScheduleLookup>,
        employees: Arc<dyn EmployeeDirectory>,
        records: Arc<dyn AttendanceStore>,
        audit: Arc<dyn AuditSink>,
        location_mode: LocationMode,
    ) -> Self {
        Self {
            schedules,
            employees,
            records,
            audit,
            location_mode,
        }
    }

    #[instrument(skip(self, actor, request), fields(employee_id = request.employee_id))]
    pub async fn check_in(
        &self,
        actor: &Actor,
        request: CheckInRequest,
    ) -> Result<AttendanceOutcome, CoreError> {
        if let Some(coords) = &request.coordinates {
            coords.validate()?;
        }

        let profile = self.profile(request.employee_id).await?;
        let today = request.now.date();

        if let Some(existing) = self.records.find(request.employee_id, today).await? {
            if existing.has_checked_in() {
                info!(%today, "Rejected duplicate check-in");
                return Err(CoreError::AlreadyCheckedIn);
            }
        }

        let shift = resolve_shift(self.schedules.as_ref(), profile.position_id, today).await?;
        let decision = decide_status(shift.as_ref(), request.now.time(), request.note);

        let (position, geofence) = if decision.is_day_off {
            (request.coordinates, GeofenceOutcome::Skipped)
        } else {
            self.gate(
                profile.workplace.as_ref(),
                request.coordinates,
                CHECK_IN_RADIUS_METERS,
            )?
        };

        let record = self
            .records
            .save_check_in(CheckInEntry {
                employee_id: request.employee_id,
                date: today,
                check_in_time: request.now.time(),
                latitude: position.map(|c| c.latitude),
                longitude: position.map(|c| c.longitude),
                status: decision.status,
                note: decision.note,
                supporting_file: request.supporting_file,
            })
            .await?;

        info!(
            record_id = record.id,
            status = %record.status,
            geofence = ?geofence,
            "Checked in"
        );

        self.log(
            ActivityLogEntry::new(
                SubjectType::AttendanceRecord,
                record.id,
                actor.user_id,
                "check_in",
                request.now,
            )
            .after(&record),
        )
        .await;

        Ok(AttendanceOutcome { record, geofence })
    }

    #[instrument(skip(self, actor, request), fields(employee_id = request.employee_id))]
    pub async fn check_out(
        &self,
        actor: &Actor,
        request: CheckOutRequest,
    ) -> Result<AttendanceOutcome, CoreError> {
        if let Some(coords) = &request.coordinates {
            coords.validate()?;
        }

        let profile = self.profile(request.employee_id).await?;
        let today = request.now.date();

        let existing = match self.records.find(request.employee_id, today).await? {
            Some(record) if record.has_checked_in() => record,
            _ => return Err(CoreError::NoCheckInYet),
        };
        if existing.has_checked_out() {
            return Err(CoreError::AlreadyCheckedOut);
        }

        // Same day-off rule as check-in: no geofence on a holiday.
        let shift = resolve_shift(self.schedules.as_ref(), profile.position_id, today).await?;
        let day_off = shift.as_ref().is_some_and(|s| s.is_day_off);
        let (position, geofence) = if day_off {
            (request.coordinates, GeofenceOutcome::Skipped)
        } else {
            self.gate(
                profile.workplace.as_ref(),
                request.coordinates,
                CHECK_OUT_RADIUS_METERS,
            )?
        };

        let record = self
            .records
            .save_check_out(CheckOutEntry {
                employee_id: request.employee_id,
                date: today,
                check_out_time: request.now.time(),
                latitude: position.map(|c| c.latitude),
                longitude: position.map(|c| c.longitude),
                note: request.note,
            })
            .await?;

        info!(record_id = record.id, geofence = ?geofence, "Checked out");

        self.log(
            ActivityLogEntry::new(
                SubjectType::AttendanceRecord,
                record.id,
                actor.user_id,
                "check_out",
                request.now,
            )
            .before(&existing)
            .after(&record),
        )
        .await;

        Ok(AttendanceOutcome { record, geofence })
    }

    /// Marks a date range as sick or leave. Dates already recorded are skipped.
    #[instrument(skip(self, actor, request), fields(employee_id = request.employee_id))]
    pub async fn mark_absence(
        &self,
        actor: &Actor,
        request: AbsenceRequest,
    ) -> Result<AbsenceReport, CoreError> {
        if !actor.role.is_hr() && !actor.owns(request.employee_id) {
            return Err(CoreError::Forbidden(
                "You can only mark absences for yourself".into(),
            ));
        }
        if request.start_date > request.end_date {
            return Err(CoreError::validation("start_date cannot be after end_date"));
        }
        let days = (request.end_date - request.start_date).num_days() + 1;
        if days > MAX_ABSENCE_DAYS {
            return Err(CoreError::validation(format!(
                "Date range covers {days} days, at most {MAX_ABSENCE_DAYS} are allowed"
            )));
        }

        self.profile(request.employee_id).await?;

        let dates: Vec<NaiveDate> = request
            .start_date
            .iter_days()
            .take_while(|d| *d <= request.end_date)
            .collect();

        let entries = dates
            .iter()
            .map(|date| ManualEntry {
                employee_id: request.employee_id,
                date: *date,
                stamped_at: request.now.time(),
                status: request.kind.status(),
                note: request.note.clone(),
                supporting_file: request.supporting_file.clone(),
            })
            .collect();

        let created = self.records.insert_manual(entries).await?;

        for record in &created {
            self.log(
                ActivityLogEntry::new(
                    SubjectType::AttendanceRecord,
                    record.id,
                    actor.user_id,
                    "manual_entry",
                    request.now,
                )
                .after(record),
            )
            .await;
        }

        let created_dates: Vec<NaiveDate> = created.iter().map(|r| r.date).collect();
        let skipped_dates: Vec<NaiveDate> = dates
            .into_iter()
            .filter(|d| !created_dates.contains(d))
            .collect();

        info!(
            created = created_dates.len(),
            skipped = skipped_dates.len(),
            kind = ?request.kind,
            "Manual absence entry"
        );

        Ok(AbsenceReport {
            created: created_dates.len(),
            skipped: skipped_dates.len(),
            created_dates,
            skipped_dates,
        })
    }

    pub async fn today(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
    ) -> Result<Option<AttendanceRecord>, CoreError> {
        self.records.find(employee_id, now.date()).await
    }

    async fn profile(&self, employee_id: u64) -> Result<EmployeeProfile, CoreError> {
        self.employees
            .profile(employee_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee not found"))
    }

    /// Applies the geofence and returns the position to store.
    fn gate(
        &self,
        workplace: Option<&Workplace>,
        reported: Option<Coordinates>,
        radius_meters: f64,
    ) -> Result<(Option<Coordinates>, GeofenceOutcome), CoreError> {
        let Some(workplace) = workplace else {
            return Ok((reported, GeofenceOutcome::Skipped));
        };
        let registered = Coordinates::new(workplace.latitude, workplace.longitude);

        let Some(reported) = reported else {
            return Ok(match self.location_mode {
                LocationMode::TrustDefaultLocation => {
                    (Some(registered), GeofenceOutcome::TrustedDefault)
                }
                LocationMode::SkipWhenMissing => (None, GeofenceOutcome::Skipped),
            });
        };

        let check = geofence::validate(reported, registered, radius_meters);
        if !check.accepted {
            warn!(
                distance = check.distance_meters,
                radius = radius_meters,
                workplace = %workplace.name,
                "Location outside geofence"
            );
            return Err(CoreError::LocationOutOfRange(Box::new(LocationOutOfRange {
                distance_meters: check.distance_meters,
                radius_meters,
                workplace_name: workplace.name.clone(),
                workplace: registered,
                reported,
            })));
        }

        Ok((
            Some(reported),
            GeofenceOutcome::Verified {
                distance_meters: check.distance_meters,
                radius_meters,
            },
        ))
    }

    async fn log(&self, entry: ActivityLogEntry) {
        // The mutation is already committed; a lost log line must not undo it.
        if let Err(e) = self.audit.record(entry).await {
            tracing::error!(error = %e, "Failed to write activity log");
        }
    }
}
