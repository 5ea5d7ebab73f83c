use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Canonical weekday keys used by the `work_shifts.weekday` column.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DayKey {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

impl From<Weekday> for DayKey {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayKey::Senin,
            Weekday::Tue => DayKey::Selasa,
            Weekday::Wed => DayKey::Rabu,
            Weekday::Thu => DayKey::Kamis,
            Weekday::Fri => DayKey::Jumat,
            Weekday::Sat => DayKey::Sabtu,
            Weekday::Sun => DayKey::Minggu,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkShift {
    pub position_id: u64,
    pub weekday: DayKey,
    #[schema(example = "07:00:00", value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "15:00:00", value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub is_day_off: bool,
    pub note: Option<String>,
}

impl WorkShift {
    /// Implicit Sunday holiday used when no row exists for "minggu".
    pub fn implicit_day_off(position_id: u64, weekday: DayKey) -> Self {
        Self {
            position_id,
            weekday,
            start_time: None,
            end_time: None,
            is_day_off: true,
            note: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekdays_map_to_indonesian_keys() {
        assert_eq!(DayKey::from(Weekday::Mon).to_string(), "senin");
        assert_eq!(DayKey::from(Weekday::Fri).to_string(), "jumat");
        assert_eq!(DayKey::from(Weekday::Sun).as_ref(), "minggu");
        assert_eq!("Rabu".parse::<DayKey>().unwrap(), DayKey::Rabu);
    }
}
