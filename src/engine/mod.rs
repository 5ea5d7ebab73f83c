pub mod attendance;
pub mod geofence;
pub mod leave;
pub mod leave_status;
pub mod schedule;

use chrono::{FixedOffset, NaiveDateTime, Utc};

use crate::model::role::Role;

use self::{attendance::AttendanceEngine, leave::LeaveWorkflow};

/// The authenticated caller, as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
    pub employee_id: Option<u64>,
}

impl Actor {
    pub fn owns(&self, employee_id: u64) -> bool {
        self.employee_id == Some(employee_id)
    }
}

/// Wall clock of the business, which runs on a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct BusinessClock {
    offset: FixedOffset,
    pinned: Option<NaiveDateTime>,
}

impl BusinessClock {
    pub fn from_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(|offset| Self {
            offset,
            pinned: None,
        })
    }

    /// A clock that always reads `at`.
    #[cfg(test)]
    pub fn pinned(at: NaiveDateTime) -> Self {
        Self {
            offset: FixedOffset::east_opt(0).unwrap(),
            pinned: Some(at),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        match self.pinned {
            Some(at) => at,
            None => Utc::now().with_timezone(&self.offset).naive_local(),
        }
    }
}

/// Shared application state handed to the HTTP layer.
pub struct Services {
    pub attendance: AttendanceEngine,
    pub leave: LeaveWorkflow,
    pub clock: BusinessClock,
}
