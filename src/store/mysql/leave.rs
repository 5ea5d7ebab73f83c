use async_trait::async_trait;

use super::{MySqlStore, is_write_conflict};
use crate::{
    error::CoreError,
    model::leave_request::{LeaveChanges, LeaveFilter, LeaveRequest, NewLeaveRequest},
    store::LeaveStore,
};

const LEAVE_COLUMNS: &str = "id, employee_id, start_date, end_date, leave_type, status, reason, \
     supporting_file, reviewer_comment, created_at, updated_at";

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

impl MySqlStore {
    async fn leave_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, CoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(leave)
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert(&self, request: NewLeaveRequest) -> Result<LeaveRequest, CoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, leave_type, status, reason, supporting_file)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.leave_type.to_string())
        .bind(&request.status)
        .bind(&request.reason)
        .bind(request.supporting_file.as_deref())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.leave_by_id(id)
            .await?
            .ok_or_else(|| CoreError::Storage(format!("leave request {id} vanished after insert")))
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, CoreError> {
        self.leave_by_id(id).await
    }

    async fn update_status(
        &self,
        id: u64,
        expected_status: &str,
        next_status: &str,
        reviewer_comment: Option<&str>,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, reviewer_comment = COALESCE(?, reviewer_comment)
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(next_status)
        .bind(reviewer_comment)
        .bind(id)
        .bind(expected_status)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            // A deadlock loser retries through the caller's CAS loop.
            Err(e) if is_write_conflict(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_details(
        &self,
        id: u64,
        expected_status: &str,
        changes: &LeaveChanges,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = COALESCE(?, start_date),
                end_date = COALESCE(?, end_date),
                leave_type = COALESCE(?, leave_type),
                reason = COALESCE(?, reason),
                supporting_file = COALESCE(?, supporting_file)
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.leave_type.map(|t| t.to_string()))
        .bind(changes.reason.as_deref())
        .bind(changes.supporting_file.as_deref())
        .bind(id)
        .bind(expected_status)
        .execute(&self.pool)
        .await?;

        // MySQL reports zero affected rows when nothing changed, so re-check the guard.
        if result.rows_affected() == 1 {
            return Ok(true);
        }
        Ok(self
            .leave_by_id(id)
            .await?
            .is_some_and(|leave| leave.status == expected_status))
    }

    async fn delete(&self, id: u64, expected_status: &str) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = ? AND status = ?")
            .bind(id)
            .bind(expected_status)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<(Vec<LeaveRequest>, i64), CoreError> {
        let offset = filter.offset();

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }

        if let Some(status) = filter.status.as_deref() {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let leaves = data_q
            .bind(filter.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((leaves, total))
    }
}
