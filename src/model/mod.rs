pub mod activity_log;
pub mod attendance;
pub mod employee;
pub mod leave_request;
pub mod role;
pub mod work_shift;
pub mod workplace;
