use async_trait::async_trait;

use super::MySqlStore;
use crate::{error::CoreError, model::activity_log::ActivityLogEntry, store::AuditSink};

#[async_trait]
impl AuditSink for MySqlStore {
    async fn record(&self, entry: ActivityLogEntry) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs
                (subject_type, subject_id, actor_id, action, old_payload, new_payload, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.subject_type.as_ref())
        .bind(entry.subject_id)
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(entry.old_payload.as_ref().map(|v| v.to_string()))
        .bind(entry.new_payload.as_ref().map(|v| v.to_string()))
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
