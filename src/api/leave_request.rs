use crate::auth::auth::AuthUser;
use crate::engine::{
    Services,
    leave::{EditLeave, SubmitLeave},
};
use crate::model::leave_request::{LeaveFilter, LeaveRequest};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// One of: cuti tahunan, cuti sakit, cuti melahirkan, cuti alasan penting,
    /// cuti besar, cuti di luar tanggungan (case-insensitive)
    #[schema(example = "cuti tahunan")]
    pub leave_type: String,
    #[schema(example = "Acara keluarga")]
    pub reason: String,
    pub supporting_file: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    #[schema(example = "2026-01-02", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-04", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "cuti sakit")]
    pub leave_type: Option<String>,
    pub reason: Option<String>,
    pub supporting_file: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewPayload {
    /// Approval comment, or rejection reason ("Ditolak" when empty)
    #[schema(example = "Silakan")]
    pub comment: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "ditinjau kepala sekolah")]
    /// Filter by the exact stored status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "ditinjau kepala sekolah"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let leave = services
        .leave
        .submit(
            &auth.actor(),
            SubmitLeave {
                start_date: payload.start_date,
                end_date: payload.end_date,
                leave_type: payload.leave_type,
                reason: payload.reason,
                supporting_file: payload.supporting_file,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": leave.status,
        "data": leave
    })))
}

/* =========================
Edit leave (owner, while pending)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to edit")
    ),
    request_body(content = UpdateLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Not the owner, or no longer editable"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let payload = payload.into_inner();

    let leave = services
        .leave
        .edit(
            &auth.actor(),
            leave_id,
            EditLeave {
                start_date: payload.start_date,
                end_date: payload.end_date,
                leave_type: payload.leave_type,
                reason: payload.reason,
                supporting_file: payload.supporting_file,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Withdraw leave (owner, while pending)
========================= */
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to withdraw")
    ),
    responses(
        (status = 200, description = "Leave request withdrawn", body = Object, example = json!({
            "message": "Leave request withdrawn"
        })),
        (status = 403, description = "Not the owner, or no longer editable"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    services
        .leave
        .withdraw(&auth.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request withdrawn"
    })))
}

/* =========================
Approve leave (reviewers)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = ReviewPayload, description = "Optional", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved",
            "status": "disetujui hrd menunggu tinjauan dirpen"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed or at another stage", body = Object, example = json!({
            "error": "conflict",
            "message": "Leave request already processed: ditolak hrd"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: Option<web::Json<ReviewPayload>>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let comment = payload.and_then(|p| p.into_inner().comment);
    let leave = services
        .leave
        .approve(&auth.actor(), path.into_inner(), comment)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved",
        "status": leave.status,
        "data": leave
    })))
}

/* =========================
Reject leave (reviewers)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = ReviewPayload, description = "Optional", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected",
            "status": "ditolak kepala hrd"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed or at another stage")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: Option<web::Json<ReviewPayload>>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let reason = payload.and_then(|p| p.into_inner().comment);
    let leave = services
        .leave
        .reject(&auth.actor(), path.into_inner(), reason)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected",
        "status": leave.status,
        "data": leave
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "error": "not_found",
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = services
        .leave
        .get(&auth.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<LeaveQuery>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).clamp(1, u32::MAX as u64);

    let (leaves, total) = services
        .leave
        .list(
            &auth.actor(),
            LeaveFilter {
                employee_id: query.employee_id,
                status: query.status,
                page,
                per_page,
            },
        )
        .await?;

    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
