use crate::model::workplace::Workplace;

/// What the attendance engine needs to know about an employee.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeProfile {
    pub employee_id: u64,
    pub position_id: u64,
    pub workplace: Option<Workplace>,
}
