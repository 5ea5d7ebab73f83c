use crate::api::attendance::{AbsencePayload, CheckInPayload, CheckOutPayload};
use crate::api::leave_request::{
    CreateLeave, LeaveListResponse, LeaveQuery, ReviewPayload, UpdateLeave,
};
use crate::engine::{attendance::AbsenceReport, geofence::Coordinates};
use crate::error::LocationOutOfRange;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    leave_request::LeaveRequest,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Presence API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave Service

Attendance and leave approval for school staff.

### 🔹 Key Features
- **Attendance**
  - Geofenced check-in (200 m) and check-out (500 m) against the registered workplace
  - Late detection with a 15 minute grace window, holidays recorded as absent ("Hari libur")
  - Bulk sick/leave marking over a date range
- **Leave**
  - Submission, edit and withdrawal while a review is pending
  - Review by principal, HRD staff, HRD head and director of education
  - Annual leave ("cuti tahunan") is forwarded to the director after HRD approval

### 🔐 Security
All endpoints require a **JWT Bearer** access token.

### 📦 Response Format
- JSON-based RESTful responses
- Errors are `{"error": kind, "message": ...}`; geofence rejections add `details`
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::mark_absence,
        crate::api::attendance::today
    ),
    components(
        schemas(
            CreateLeave,
            UpdateLeave,
            ReviewPayload,
            LeaveQuery,
            LeaveListResponse,
            LeaveRequest,
            CheckInPayload,
            CheckOutPayload,
            AbsencePayload,
            AbsenceReport,
            AttendanceRecord,
            AttendanceStatus,
            Coordinates,
            LocationOutOfRange
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/leave",
            "/api/leave/{leave_id}",
            "/api/leave/{leave_id}/approve",
            "/api/leave/{leave_id}/reject",
            "/api/attendance/check-in",
            "/api/attendance/check-out",
            "/api/attendance/absence",
            "/api/attendance/today",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
