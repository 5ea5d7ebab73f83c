//! Leave request lifecycle: submission, employee edits and role-driven review.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::{
    engine::{
        Actor, BusinessClock,
        leave_status::{LeaveStatus, Stage},
    },
    error::CoreError,
    model::{
        activity_log::{ActivityLogEntry, SubjectType},
        leave_request::{
            LeaveChanges, LeaveFilter, LeaveRequest, LeaveType, NewLeaveRequest, is_annual_leave,
        },
        role::Role,
    },
    store::{AuditSink, LeaveStore},
};

/// Stored as the reviewer comment when a rejection gives no reason.
pub const DEFAULT_REJECTION_REASON: &str = "Ditolak";

/// Compare-and-swap attempts before giving up on a contended request.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Computes the next status for a reviewer's decision.
///
/// HRD staff, HRD head and super-admin share one path: annual leave is
/// forwarded to the director, every other type stops at their approval.
/// Principal and director decisions only apply at their own stage.
pub fn next_status(
    role: Role,
    decision: Decision,
    current: &LeaveStatus,
    leave_type: &str,
) -> Result<LeaveStatus, CoreError> {
    let annual = is_annual_leave(leave_type);

    let stage = match role {
        Role::KepalaHrd | Role::StaffHrd | Role::SuperAdmin => {
            ensure_open(current)?;
            if current.is_with_director() {
                return Err(CoreError::InvalidTransition(
                    "Leave request is awaiting director review".into(),
                ));
            }
            if role == Role::KepalaHrd {
                Stage::HrdHeadReview
            } else {
                Stage::HrdReview
            }
        }
        Role::KepalaSekolah => {
            ensure_open(current)?;
            if *current != LeaveStatus::submitted() {
                return Err(CoreError::InvalidTransition(
                    "Leave request is no longer awaiting principal review".into(),
                ));
            }
            Stage::PrincipalReview
        }
        Role::Dirpen => {
            ensure_open(current)?;
            if !current.is_with_director() {
                return Err(CoreError::InvalidTransition(
                    "Leave request is not awaiting director review".into(),
                ));
            }
            Stage::DirectorReview
        }
        Role::Karyawan => {
            return Err(CoreError::Unauthorized(
                "Only reviewers can approve or reject leave".into(),
            ));
        }
    };

    Ok(match decision {
        Decision::Approve => LeaveStatus::approved(stage, annual),
        Decision::Reject => LeaveStatus::rejected(stage),
    })
}

fn ensure_open(current: &LeaveStatus) -> Result<(), CoreError> {
    if current.is_terminal() {
        return Err(CoreError::AlreadyProcessed(current.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SubmitLeave {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub reason: String,
    pub supporting_file: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EditLeave {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub leave_type: Option<String>,
    pub reason: Option<String>,
    pub supporting_file: Option<String>,
}

pub struct LeaveWorkflow {
    leaves: Arc<dyn LeaveStore>,
    audit: Arc<dyn AuditSink>,
    clock: BusinessClock,
}

impl LeaveWorkflow {
    pub fn new(leaves: Arc<dyn LeaveStore>, audit: Arc<dyn AuditSink>, clock: BusinessClock) -> Self {
        Self {
            leaves,
            audit,
            clock,
        }
    }

    #[instrument(skip(self, actor, submission), fields(user_id = actor.user_id))]
    pub async fn submit(
        &self,
        actor: &Actor,
        submission: SubmitLeave,
    ) -> Result<LeaveRequest, CoreError> {
        let employee_id = actor
            .employee_id
            .ok_or_else(|| CoreError::Forbidden("No employee profile".into()))?;

        validate_dates(submission.start_date, submission.end_date)?;
        let leave_type = parse_leave_type(&submission.leave_type)?;
        let reason = submission.reason.trim().to_string();
        if reason.is_empty() {
            return Err(CoreError::validation("reason must not be empty"));
        }

        let created = self
            .leaves
            .insert(NewLeaveRequest {
                employee_id,
                start_date: submission.start_date,
                end_date: submission.end_date,
                leave_type,
                status: LeaveStatus::submitted().to_string(),
                reason,
                supporting_file: submission.supporting_file,
            })
            .await?;

        info!(leave_id = created.id, employee_id, "Leave request submitted");
        self.log(actor, &created, "create", None, Some(&created)).await;

        Ok(created)
    }

    pub async fn approve(
        &self,
        actor: &Actor,
        leave_id: u64,
        comment: Option<String>,
    ) -> Result<LeaveRequest, CoreError> {
        self.review(actor, leave_id, Decision::Approve, comment).await
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        leave_id: u64,
        reason: Option<String>,
    ) -> Result<LeaveRequest, CoreError> {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());
        self.review(actor, leave_id, Decision::Reject, Some(reason)).await
    }

    #[instrument(skip(self, actor, comment), fields(role = %actor.role))]
    async fn review(
        &self,
        actor: &Actor,
        leave_id: u64,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<LeaveRequest, CoreError> {
        if actor.role == Role::Karyawan {
            return Err(CoreError::Unauthorized(
                "Only reviewers can approve or reject leave".into(),
            ));
        }

        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self.load(leave_id).await?;
            let status: LeaveStatus = current.status.parse()?;
            let next = next_status(actor.role, decision, &status, &current.leave_type)?;

            let swapped = self
                .leaves
                .update_status(
                    leave_id,
                    &current.status,
                    &next.to_string(),
                    comment.as_deref(),
                )
                .await?;

            if swapped {
                // Re-read so the caller never sees the pre-update status.
                let updated = self.load(leave_id).await?;
                info!(leave_id, from = %current.status, to = %updated.status, "Leave reviewed");
                let action = match decision {
                    Decision::Approve => "approve",
                    Decision::Reject => "reject",
                };
                self.log(actor, &updated, action, Some(&current), Some(&updated))
                    .await;
                return Ok(updated);
            }

            warn!(leave_id, attempt, "Leave status changed concurrently, re-reading");
        }

        Err(CoreError::InvalidTransition(
            "Leave request is being modified by another reviewer".into(),
        ))
    }

    #[instrument(skip(self, actor, edit), fields(user_id = actor.user_id))]
    pub async fn edit(
        &self,
        actor: &Actor,
        leave_id: u64,
        edit: EditLeave,
    ) -> Result<LeaveRequest, CoreError> {
        let current = self.load(leave_id).await?;
        ensure_owner_may_change(actor, &current)?;

        let changes = LeaveChanges {
            start_date: edit.start_date,
            end_date: edit.end_date,
            leave_type: edit.leave_type.as_deref().map(parse_leave_type).transpose()?,
            reason: match edit.reason {
                Some(r) if r.trim().is_empty() => {
                    return Err(CoreError::validation("reason must not be empty"));
                }
                other => other.map(|r| r.trim().to_string()),
            },
            supporting_file: edit.supporting_file,
        };
        validate_dates(
            changes.start_date.unwrap_or(current.start_date),
            changes.end_date.unwrap_or(current.end_date),
        )?;

        if !self
            .leaves
            .update_details(leave_id, &current.status, &changes)
            .await?
        {
            return Err(CoreError::Forbidden(
                "Leave request can no longer be changed".into(),
            ));
        }

        let updated = self.load(leave_id).await?;
        self.log(actor, &updated, "update", Some(&current), Some(&updated))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(user_id = actor.user_id))]
    pub async fn withdraw(&self, actor: &Actor, leave_id: u64) -> Result<(), CoreError> {
        let current = self.load(leave_id).await?;
        ensure_owner_may_change(actor, &current)?;

        if !self.leaves.delete(leave_id, &current.status).await? {
            return Err(CoreError::Forbidden(
                "Leave request can no longer be changed".into(),
            ));
        }

        info!(leave_id, "Leave request withdrawn");
        self.log(actor, &current, "delete", Some(&current), None).await;
        Ok(())
    }

    /// Employees only see their own requests; reviewers see everything.
    pub async fn get(&self, actor: &Actor, leave_id: u64) -> Result<LeaveRequest, CoreError> {
        let leave = self.load(leave_id).await?;
        if actor.role == Role::Karyawan && !actor.owns(leave.employee_id) {
            return Err(CoreError::Forbidden("Not your leave request".into()));
        }
        Ok(leave)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: LeaveFilter,
    ) -> Result<(Vec<LeaveRequest>, i64), CoreError> {
        if actor.role == Role::Karyawan {
            let own = actor
                .employee_id
                .ok_or_else(|| CoreError::Forbidden("No employee profile".into()))?;
            filter.employee_id = Some(own);
        }
        self.leaves.list(&filter).await
    }

    async fn load(&self, leave_id: u64) -> Result<LeaveRequest, CoreError> {
        self.leaves
            .find(leave_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Leave request not found"))
    }

    async fn log(
        &self,
        actor: &Actor,
        leave: &LeaveRequest,
        action: &str,
        before: Option<&LeaveRequest>,
        after: Option<&LeaveRequest>,
    ) {
        let mut entry = ActivityLogEntry::new(
            SubjectType::LeaveRequest,
            leave.id,
            actor.user_id,
            action,
            self.clock.now(),
        );
        if let Some(before) = before {
            entry = entry.before(before);
        }
        if let Some(after) = after {
            entry = entry.after(after);
        }
        if let Err(e) = self.audit.record(entry).await {
            tracing::error!(error = %e, leave_id = leave.id, "Failed to write activity log");
        }
    }
}

fn validate_dates(start: NaiveDate, end: NaiveDate) -> Result<(), CoreError> {
    if start > end {
        return Err(CoreError::validation("start_date cannot be after end_date"));
    }
    Ok(())
}

fn parse_leave_type(raw: &str) -> Result<LeaveType, CoreError> {
    LeaveType::parse(raw).ok_or_else(|| {
        CoreError::validation(format!(
            "Invalid leave type '{raw}'. Allowed: cuti tahunan, cuti sakit, cuti melahirkan, \
             cuti alasan penting, cuti besar, cuti di luar tanggungan"
        ))
    })
}

fn ensure_owner_may_change(actor: &Actor, leave: &LeaveRequest) -> Result<(), CoreError> {
    if !actor.owns(leave.employee_id) {
        return Err(CoreError::Forbidden("Not your leave request".into()));
    }
    let status: LeaveStatus = leave.status.parse()?;
    if !status.is_editable_by_employee() {
        return Err(CoreError::Forbidden(format!(
            "Leave request is already '{}' and can no longer be changed",
            leave.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    const EMPLOYEE: u64 = 1000;

    fn actor(role: Role, employee_id: Option<u64>) -> Actor {
        Actor {
            user_id: role.id() as u64 * 10,
            role,
            employee_id,
        }
    }

    fn employee() -> Actor {
        actor(Role::Karyawan, Some(EMPLOYEE))
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn workflow() -> (Arc<MemoryStore>, LeaveWorkflow) {
        let store = Arc::new(MemoryStore::default());
        let clock = BusinessClock::from_hours(7).unwrap();
        (store.clone(), LeaveWorkflow::new(store.clone(), store, clock))
    }

    async fn submitted(workflow: &LeaveWorkflow, leave_type: &str) -> LeaveRequest {
        workflow
            .submit(
                &employee(),
                SubmitLeave {
                    start_date: date(2),
                    end_date: date(4),
                    leave_type: leave_type.into(),
                    reason: "Acara keluarga".into(),
                    supporting_file: None,
                },
            )
            .await
            .unwrap()
    }

    #[test]
    fn hrd_staff_forwards_only_annual_leave() {
        let start = LeaveStatus::submitted();
        let annual = next_status(Role::StaffHrd, Decision::Approve, &start, "cuti tahunan").unwrap();
        assert_eq!(annual.to_string(), "disetujui hrd menunggu tinjauan dirpen");

        let sick = next_status(Role::StaffHrd, Decision::Approve, &start, "cuti sakit").unwrap();
        assert_eq!(sick.to_string(), "disetujui hrd");
        assert!(sick.is_terminal());
    }

    #[test]
    fn hrd_head_forwards_only_annual_leave() {
        let start = LeaveStatus::pending(Stage::HrdHeadReview);
        let annual = next_status(Role::KepalaHrd, Decision::Approve, &start, "Cuti Tahunan").unwrap();
        assert_eq!(annual.to_string(), "disetujui kepala hrd menunggu tinjauan dirpen");

        let other = next_status(Role::KepalaHrd, Decision::Approve, &start, "cuti besar").unwrap();
        assert_eq!(other.to_string(), "disetujui kepala hrd");
    }

    #[test]
    fn rejection_stage_follows_role() {
        let start = LeaveStatus::submitted();
        for leave_type in ["cuti tahunan", "cuti sakit"] {
            let head = next_status(Role::KepalaHrd, Decision::Reject, &start, leave_type).unwrap();
            assert_eq!(head.to_string(), "ditolak kepala hrd");
            let staff = next_status(Role::StaffHrd, Decision::Reject, &start, leave_type).unwrap();
            assert_eq!(staff.to_string(), "ditolak hrd");
            let admin = next_status(Role::SuperAdmin, Decision::Reject, &start, leave_type).unwrap();
            assert_eq!(admin.to_string(), "ditolak hrd");
        }
    }

    #[test]
    fn terminal_requests_cannot_be_reviewed_again() {
        let done = LeaveStatus::rejected(Stage::HrdReview);
        let err = next_status(Role::KepalaHrd, Decision::Approve, &done, "cuti sakit").unwrap_err();
        assert!(matches!(err, CoreError::AlreadyProcessed(_)));
    }

    #[test]
    fn principal_and_director_act_at_their_own_stage() {
        let start = LeaveStatus::submitted();
        let principal =
            next_status(Role::KepalaSekolah, Decision::Approve, &start, "cuti tahunan").unwrap();
        assert_eq!(
            principal.to_string(),
            "disetujui kepala sekolah menunggu tinjauan dirpen"
        );

        let early = next_status(Role::Dirpen, Decision::Approve, &start, "cuti tahunan");
        assert!(matches!(early, Err(CoreError::InvalidTransition(_))));

        let forwarded = LeaveStatus::approved(Stage::HrdReview, true);
        let director = next_status(Role::Dirpen, Decision::Approve, &forwarded, "cuti tahunan").unwrap();
        assert_eq!(director.to_string(), "disetujui dirpen");
        let refused = next_status(Role::Dirpen, Decision::Reject, &forwarded, "cuti tahunan").unwrap();
        assert_eq!(refused.to_string(), "ditolak dirpen");

        let late_principal =
            next_status(Role::KepalaSekolah, Decision::Reject, &forwarded, "cuti tahunan");
        assert!(matches!(late_principal, Err(CoreError::InvalidTransition(_))));
    }

    #[test]
    fn hrd_cannot_override_requests_forwarded_to_director() {
        let forwarded = [
            LeaveStatus::approved(Stage::HrdReview, true),
            LeaveStatus::approved(Stage::HrdHeadReview, true),
            LeaveStatus::approved(Stage::PrincipalReview, true),
            LeaveStatus::pending(Stage::DirectorReview),
        ];
        for current in &forwarded {
            for role in [Role::KepalaHrd, Role::StaffHrd, Role::SuperAdmin] {
                for decision in [Decision::Approve, Decision::Reject] {
                    let result = next_status(role, decision, current, "cuti tahunan");
                    assert!(
                        matches!(result, Err(CoreError::InvalidTransition(_))),
                        "{role:?} {decision:?} on {current}"
                    );
                }
            }
        }
    }

    #[actix_web::test]
    async fn forwarded_annual_leave_waits_for_director() {
        let (store, workflow) = workflow();
        let leave = submitted(&workflow, "cuti tahunan").await;
        workflow
            .approve(&actor(Role::StaffHrd, None), leave.id, None)
            .await
            .unwrap();

        let err = workflow
            .reject(&actor(Role::KepalaHrd, None), leave.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
        assert_eq!(
            store.leave(leave.id).unwrap().status,
            "disetujui hrd menunggu tinjauan dirpen"
        );

        let decided = workflow
            .reject(&actor(Role::Dirpen, None), leave.id, None)
            .await
            .unwrap();
        assert_eq!(decided.status, "ditolak dirpen");
    }

    #[actix_web::test]
    async fn submission_starts_with_principal() {
        let (store, workflow) = workflow();
        let leave = submitted(&workflow, "CUTI SAKIT").await;
        assert_eq!(leave.status, "ditinjau kepala sekolah");
        assert_eq!(leave.leave_type, "cuti sakit");
        assert_eq!(store.audit_entries()[0].action, "create");
    }

    #[actix_web::test]
    async fn submission_is_validated() {
        let (_, workflow) = workflow();
        let base = SubmitLeave {
            start_date: date(4),
            end_date: date(2),
            leave_type: "cuti tahunan".into(),
            reason: "Mudik".into(),
            supporting_file: None,
        };
        let reversed = workflow.submit(&employee(), base.clone()).await;
        assert!(matches!(reversed, Err(CoreError::Validation(_))));

        let unknown = SubmitLeave {
            start_date: date(2),
            end_date: date(4),
            leave_type: "liburan".into(),
            ..base.clone()
        };
        assert!(matches!(
            workflow.submit(&employee(), unknown).await,
            Err(CoreError::Validation(_))
        ));

        let no_profile = actor(Role::StaffHrd, None);
        let request = SubmitLeave {
            start_date: date(2),
            end_date: date(4),
            ..base
        };
        assert!(matches!(
            workflow.submit(&no_profile, request).await,
            Err(CoreError::Forbidden(_))
        ));
    }

    #[actix_web::test]
    async fn approve_returns_fresh_state_and_keeps_comment() {
        let (store, workflow) = workflow();
        let leave = submitted(&workflow, "cuti tahunan").await;

        let approved = workflow
            .approve(&actor(Role::StaffHrd, None), leave.id, Some("Lengkap".into()))
            .await
            .unwrap();
        assert_eq!(approved.status, "disetujui hrd menunggu tinjauan dirpen");
        assert_eq!(approved.reviewer_comment.as_deref(), Some("Lengkap"));
        assert_eq!(store.leave(leave.id).unwrap(), approved);

        let final_state = workflow
            .approve(&actor(Role::Dirpen, None), leave.id, None)
            .await
            .unwrap();
        assert_eq!(final_state.status, "disetujui dirpen");
        assert_eq!(final_state.reviewer_comment.as_deref(), Some("Lengkap"));

        let actions: Vec<String> = store.audit_entries().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["create", "approve", "approve"]);
    }

    #[actix_web::test]
    async fn reject_defaults_reason() {
        let (_, workflow) = workflow();
        let leave = submitted(&workflow, "cuti tahunan").await;
        let rejected = workflow
            .reject(&actor(Role::KepalaHrd, None), leave.id, None)
            .await
            .unwrap();
        assert_eq!(rejected.status, "ditolak kepala hrd");
        assert_eq!(rejected.reviewer_comment.as_deref(), Some(DEFAULT_REJECTION_REASON));

        let again = workflow
            .reject(&actor(Role::StaffHrd, None), leave.id, Some("Kuota habis".into()))
            .await;
        assert!(matches!(again, Err(CoreError::AlreadyProcessed(_))));
    }

    #[actix_web::test]
    async fn employees_cannot_review() {
        let (store, workflow) = workflow();
        let leave = submitted(&workflow, "cuti sakit").await;
        let err = workflow.approve(&employee(), leave.id, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
        assert_eq!(store.leave(leave.id).unwrap().status, "ditinjau kepala sekolah");
    }

    #[actix_web::test]
    async fn concurrent_reviewer_sees_updated_status() {
        let (store, workflow) = workflow();
        let leave = submitted(&workflow, "cuti sakit").await;

        // Another reviewer lands first between our read and our write.
        store.race_next_status_update("ditolak hrd");

        let err = workflow
            .approve(&actor(Role::KepalaHrd, None), leave.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyProcessed(ref s) if s == "ditolak hrd"));
        assert_eq!(store.leave(leave.id).unwrap().status, "ditolak hrd");
    }

    #[actix_web::test]
    async fn owner_edits_and_withdraws_only_while_under_review() {
        let (store, workflow) = workflow();
        let leave = submitted(&workflow, "cuti sakit").await;

        let edited = workflow
            .edit(
                &employee(),
                leave.id,
                EditLeave {
                    end_date: Some(date(5)),
                    leave_type: Some("cuti alasan penting".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.end_date, date(5));
        assert_eq!(edited.leave_type, "cuti alasan penting");
        assert_eq!(edited.reason, "Acara keluarga");

        let stranger = actor(Role::Karyawan, Some(1));
        assert!(matches!(
            workflow.withdraw(&stranger, leave.id).await,
            Err(CoreError::Forbidden(_))
        ));

        workflow
            .approve(&actor(Role::StaffHrd, None), leave.id, None)
            .await
            .unwrap();

        let late_edit = workflow
            .edit(
                &employee(),
                leave.id,
                EditLeave {
                    reason: Some("Lain".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(late_edit, Err(CoreError::Forbidden(_))));
        assert!(matches!(
            workflow.withdraw(&employee(), leave.id).await,
            Err(CoreError::Forbidden(_))
        ));
        assert!(store.leave(leave.id).is_some());
    }

    #[actix_web::test]
    async fn withdraw_removes_pending_request() {
        let (store, workflow) = workflow();
        let leave = submitted(&workflow, "cuti sakit").await;
        workflow.withdraw(&employee(), leave.id).await.unwrap();
        assert!(store.leave(leave.id).is_none());
        assert!(matches!(
            workflow.get(&employee(), leave.id).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn employees_list_only_their_own() {
        let (_, workflow) = workflow();
        submitted(&workflow, "cuti sakit").await;
        workflow
            .submit(
                &actor(Role::Karyawan, Some(2000)),
                SubmitLeave {
                    start_date: date(2),
                    end_date: date(2),
                    leave_type: "cuti besar".into(),
                    reason: "Umroh".into(),
                    supporting_file: None,
                },
            )
            .await
            .unwrap();

        let filter = LeaveFilter {
            page: 1,
            per_page: 10,
            ..Default::default()
        };
        let (own, total) = workflow.list(&employee(), filter.clone()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(own[0].employee_id, EMPLOYEE);

        let (all, total) = workflow
            .list(&actor(Role::KepalaHrd, None), filter)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);
    }

    #[actix_web::test]
    async fn pages_past_the_end_are_empty() {
        let (_, workflow) = workflow();
        submitted(&workflow, "cuti sakit").await;

        let (rows, total) = workflow
            .list(
                &actor(Role::KepalaHrd, None),
                LeaveFilter {
                    page: u64::MAX,
                    per_page: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(rows.is_empty());
    }
}
