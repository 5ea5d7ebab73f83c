//! Typed view of the legacy leave status strings.
//!
//! Stored values look like `ditinjau kepala sekolah`, `disetujui hrd menunggu
//! tinjauan dirpen` or `ditolak dirpen`. They are parsed into [`LeaveStatus`]
//! on read and written back through `Display`.

use std::{fmt, str::FromStr};

use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::error::CoreError;

const AWAITING_DIRECTOR_SUFFIX: &str = "menunggu tinjauan dirpen";

/// The role whose review the status refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, AsRefStr, EnumString, EnumIter)]
pub enum Stage {
    #[strum(serialize = "kepala sekolah")]
    PrincipalReview,
    #[strum(serialize = "hrd")]
    HrdReview,
    #[strum(serialize = "kepala hrd")]
    HrdHeadReview,
    #[strum(serialize = "dirpen")]
    DirectorReview,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, AsRefStr, EnumString, EnumIter)]
pub enum Outcome {
    #[strum(serialize = "ditinjau")]
    Pending,
    #[strum(serialize = "disetujui")]
    Approved,
    #[strum(serialize = "ditolak")]
    Rejected,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LeaveStatus {
    pub stage: Stage,
    pub outcome: Outcome,
    pub awaiting_director: bool,
}

impl LeaveStatus {
    /// Every new request starts with the school principal.
    pub fn submitted() -> Self {
        Self::pending(Stage::PrincipalReview)
    }

    pub fn pending(stage: Stage) -> Self {
        Self {
            stage,
            outcome: Outcome::Pending,
            awaiting_director: false,
        }
    }

    /// The director never forwards to themselves.
    pub fn approved(stage: Stage, forward_to_director: bool) -> Self {
        Self {
            stage,
            outcome: Outcome::Approved,
            awaiting_director: forward_to_director && stage != Stage::DirectorReview,
        }
    }

    pub fn rejected(stage: Stage) -> Self {
        Self {
            stage,
            outcome: Outcome::Rejected,
            awaiting_director: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self.outcome {
            Outcome::Pending => false,
            Outcome::Rejected => true,
            Outcome::Approved => !self.awaiting_director,
        }
    }

    /// True when the next decision belongs to the director of education.
    pub fn is_with_director(&self) -> bool {
        self.awaiting_director
            || (self.stage == Stage::DirectorReview && self.outcome == Outcome::Pending)
    }

    /// The employee may still edit or withdraw while a non-director review is pending.
    pub fn is_editable_by_employee(&self) -> bool {
        self.outcome == Outcome::Pending && self.stage != Stage::DirectorReview
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.outcome.as_ref(), self.stage.as_ref())?;
        if self.awaiting_director {
            write!(f, " {AWAITING_DIRECTOR_SUFFIX}")?;
        }
        Ok(())
    }
}

impl FromStr for LeaveStatus {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::validation(format!("Unrecognised leave status '{raw}'"));

        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let (verb, rest) = normalized.split_once(' ').ok_or_else(invalid)?;
        let outcome = Outcome::from_str(verb).map_err(|_| invalid())?;

        let (stage_name, awaiting_director) = match rest.strip_suffix(AWAITING_DIRECTOR_SUFFIX) {
            Some(stage) => (stage.trim_end(), true),
            None => (rest, false),
        };
        let stage = Stage::from_str(stage_name).map_err(|_| invalid())?;

        if awaiting_director && (outcome != Outcome::Approved || stage == Stage::DirectorReview) {
            return Err(invalid());
        }

        Ok(Self {
            stage,
            outcome,
            awaiting_director,
        })
    }
}
