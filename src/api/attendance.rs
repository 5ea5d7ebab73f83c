use crate::auth::auth::AuthUser;
use crate::engine::{
    Services,
    attendance::{AbsenceKind, AbsenceRequest, CheckInRequest, CheckOutRequest},
    geofence::Coordinates,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CheckInPayload {
    #[schema(example = json!(-6.2009))]
    pub latitude: Option<f64>,
    #[schema(example = 106.8167)]
    pub longitude: Option<f64>,
    #[schema(example = "Macet di jalan")]
    pub note: Option<String>,
    pub supporting_file: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckOutPayload {
    #[schema(example = json!(-6.2009))]
    pub latitude: Option<f64>,
    #[schema(example = 106.8167)]
    pub longitude: Option<f64>,
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AbsencePayload {
    /// Defaults to the caller's own employee record
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// `sakit` or `izin`
    #[schema(example = "sakit")]
    pub kind: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub note: Option<String>,
    pub supporting_file: Option<String>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(content = CheckInPayload, content_type = "application/json"),
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "data": {"id": 1, "employee_id": 1000, "date": "2026-01-05", "check_in_time": "08:20:00", "status": "late", "note": "Terlambat 20 menit"},
            "geofence": {"mode": "verified", "distance_meters": 98.4, "radius_meters": 200.0}
        })),
        (status = 400, description = "Invalid coordinates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "conflict",
            "message": "Already checked in today"
        })),
        (status = 422, description = "Outside the workplace radius"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<CheckInPayload>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let outcome = services
        .attendance
        .check_in(
            &auth.actor(),
            CheckInRequest {
                employee_id,
                now: services.clock.now(),
                coordinates: Coordinates::from_pair(payload.latitude, payload.longitude)?,
                note: payload.note,
                supporting_file: payload.supporting_file,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "data": outcome.record,
        "geofence": outcome.geofence
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body(content = CheckOutPayload, content_type = "application/json"),
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "No check-in today or already checked out", body = Object, example = json!({
            "error": "conflict",
            "message": "No check-in found for today"
        })),
        (status = 422, description = "Outside the workplace radius"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<CheckOutPayload>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let outcome = services
        .attendance
        .check_out(
            &auth.actor(),
            CheckOutRequest {
                employee_id,
                now: services.clock.now(),
                coordinates: Coordinates::from_pair(payload.latitude, payload.longitude)?,
                note: payload.note,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "data": outcome.record,
        "geofence": outcome.geofence
    })))
}

/// Marks a date range as sick or leave; dates already recorded are skipped
#[utoipa::path(
    post,
    path = "/api/attendance/absence",
    request_body(content = AbsencePayload, content_type = "application/json"),
    responses(
        (status = 200, description = "Absence recorded", body = crate::engine::attendance::AbsenceReport),
        (status = 400, description = "Invalid kind or date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_absence(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<AbsencePayload>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let employee_id = match payload.employee_id {
        Some(id) => id,
        None => auth.require_employee()?,
    };

    let report = services
        .attendance
        .mark_absence(
            &auth.actor(),
            AbsenceRequest {
                employee_id,
                kind: AbsenceKind::parse(&payload.kind)?,
                start_date: payload.start_date,
                end_date: payload.end_date,
                note: payload.note,
                supporting_file: payload.supporting_file,
                now: services.clock.now(),
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(report))
}

/// The caller's attendance record for today, if any
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record or null", body = Object, example = json!({
            "data": null
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    services: web::Data<Services>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let record = services
        .attendance
        .today(employee_id, services.clock.now())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "data": record })))
}
