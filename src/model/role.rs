use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Roles carried in the `role` claim of the access token.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[strum(to_string = "super admin")]
    SuperAdmin = 1,
    #[strum(to_string = "kepala hrd")]
    KepalaHrd = 2,
    #[strum(to_string = "staff hrd")]
    StaffHrd = 3,
    #[strum(to_string = "kepala sekolah")]
    KepalaSekolah = 4,
    #[strum(to_string = "dirpen")]
    Dirpen = 5,
    #[strum(to_string = "karyawan")]
    Karyawan = 6,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::KepalaHrd),
            3 => Some(Role::StaffHrd),
            4 => Some(Role::KepalaSekolah),
            5 => Some(Role::Dirpen),
            6 => Some(Role::Karyawan),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Roles allowed through the HRD approval handler.
    pub fn is_hrd_approver(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::KepalaHrd | Role::StaffHrd)
    }

    /// Roles that may read or mark attendance for other employees.
    pub fn is_hr(self) -> bool {
        self.is_hrd_approver()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_parse_case_insensitively() {
        assert_eq!("Kepala HRD".parse::<Role>().unwrap(), Role::KepalaHrd);
        assert_eq!("staff hrd".parse::<Role>().unwrap(), Role::StaffHrd);
        assert_eq!(Role::KepalaSekolah.to_string(), "kepala sekolah");
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn role_ids_match_claims() {
        for id in 1..=6 {
            assert_eq!(Role::from_id(id).map(Role::id), Some(id));
        }
        assert_eq!(Role::from_id(0), None);
        assert!(!Role::Karyawan.is_hrd_approver());
        assert!(!Role::Dirpen.is_hrd_approver());
    }
}
