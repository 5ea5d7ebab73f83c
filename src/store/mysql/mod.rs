//! MySQL implementation of the storage traits.

mod attendance;
mod audit;
mod directory;
mod leave;

pub(crate) use directory::ShiftRow;

use sqlx::MySqlPool;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// SQLSTATE for duplicate keys and for deadlocks, both of which mean a
/// concurrent writer got there first.
fn is_write_conflict(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("23000") | Some("40001"))
        }
        _ => false,
    }
}
