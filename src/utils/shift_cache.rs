use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

use crate::{
    error::CoreError,
    model::work_shift::{DayKey, WorkShift},
    store::{ScheduleLookup, mysql::ShiftRow},
};

/// `None` entries are cached too, so missing rows do not hit the database
/// on every check-in.
pub type ShiftCache = Cache<(u64, DayKey), Option<WorkShift>>;

pub fn build_shift_cache(ttl: Duration) -> ShiftCache {
    Cache::builder()
        .max_capacity(50_000)
        .time_to_live(ttl)
        .build()
}

/// Read-through cache in front of another [`ScheduleLookup`].
pub struct CachedScheduleLookup {
    inner: Arc<dyn ScheduleLookup>,
    cache: ShiftCache,
}

impl CachedScheduleLookup {
    pub fn new(inner: Arc<dyn ScheduleLookup>, cache: ShiftCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ScheduleLookup for CachedScheduleLookup {
    async fn shift_for(
        &self,
        position_id: u64,
        weekday: DayKey,
    ) -> Result<Option<WorkShift>, CoreError> {
        let key = (position_id, weekday);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }

        let shift = self.inner.shift_for(position_id, weekday).await?;
        self.cache.insert(key, shift.clone()).await;
        Ok(shift)
    }
}

/// Batch insert shifts into the cache
async fn batch_insert(cache: &ShiftCache, shifts: &[WorkShift]) {
    let futures: Vec<_> = shifts
        .iter()
        .map(|s| cache.insert((s.position_id, s.weekday), Some(s.clone())))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Loads every stored shift into the cache, in batches.
pub async fn warmup_shift_cache(
    pool: &MySqlPool,
    cache: &ShiftCache,
    batch_size: usize,
) -> Result<()> {
    let mut stream = sqlx::query_as::<_, ShiftRow>(
        r#"
        SELECT position_id, weekday, start_time, end_time, is_day_off, note
        FROM work_shifts
        ORDER BY position_id
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let row = row?;
        match WorkShift::try_from(row) {
            Ok(shift) => batch.push(shift),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed work shift");
                continue;
            }
        }
        total_count += 1;

        if batch.len() >= batch_size {
            batch_insert(cache, &batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_insert(cache, &batch).await;
    }

    tracing::info!("Shift cache warmup complete: {} shifts", total_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveTime;

    #[derive(Default)]
    struct CountingLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScheduleLookup for CountingLookup {
        async fn shift_for(
            &self,
            position_id: u64,
            weekday: DayKey,
        ) -> Result<Option<WorkShift>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if weekday == DayKey::Minggu {
                return Ok(None);
            }
            Ok(Some(WorkShift {
                position_id,
                weekday,
                start_time: NaiveTime::from_hms_opt(7, 0, 0),
                end_time: NaiveTime::from_hms_opt(15, 0, 0),
                is_day_off: false,
                note: None,
            }))
        }
    }

    #[actix_web::test]
    async fn repeated_lookups_hit_the_cache() {
        let inner = Arc::new(CountingLookup::default());
        let cached = CachedScheduleLookup::new(
            inner.clone(),
            build_shift_cache(Duration::from_secs(60)),
        );

        let first = cached.shift_for(3, DayKey::Senin).await.unwrap();
        let second = cached.shift_for(3, DayKey::Senin).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.shift_for(3, DayKey::Selasa).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[actix_web::test]
    async fn missing_rows_are_cached() {
        let inner = Arc::new(CountingLookup::default());
        let cached = CachedScheduleLookup::new(
            inner.clone(),
            build_shift_cache(Duration::from_secs(60)),
        );

        assert_eq!(cached.shift_for(3, DayKey::Minggu).await.unwrap(), None);
        assert_eq!(cached.shift_for(3, DayKey::Minggu).await.unwrap(), None);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn batch_insert_seeds_entries() {
        let cache = build_shift_cache(Duration::from_secs(60));
        let shift = WorkShift::implicit_day_off(9, DayKey::Sabtu);
        batch_insert(&cache, std::slice::from_ref(&shift)).await;

        assert_eq!(cache.get(&(9, DayKey::Sabtu)).await, Some(Some(shift)));
    }
}
