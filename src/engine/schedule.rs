use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::{
    error::CoreError,
    model::work_shift::{DayKey, WorkShift},
    store::ScheduleLookup,
};

/// Resolves the shift that applies to `date`.
///
/// An explicit row for the weekday always wins. Without one, Sunday is a day
/// off and every other weekday is unscheduled.
pub async fn resolve_shift(
    lookup: &dyn ScheduleLookup,
    position_id: u64,
    date: NaiveDate,
) -> Result<Option<WorkShift>, CoreError> {
    let weekday = DayKey::from(date.weekday());

    if let Some(shift) = lookup.shift_for(position_id, weekday).await? {
        return Ok(Some(shift));
    }

    if weekday == DayKey::Minggu {
        debug!(position_id, %date, "No Sunday shift stored, treating as day off");
        return Ok(Some(WorkShift::implicit_day_off(position_id, weekday)));
    }

    Ok(None)
}
