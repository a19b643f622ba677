use serde::{Deserialize, Serialize};

use super::raw::RunnerMovement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    First,
    Second,
    Third,
}

impl Base {
    /// Parse a feed base code ("1B", "2B", "3B"). Home plate, "score" and
    /// anything else map to `None`.
    pub fn from_code(code: &str) -> Option<Base> {
        match code.trim().to_ascii_uppercase().as_str() {
            "1B" => Some(Base::First),
            "2B" => Some(Base::Second),
            "3B" => Some(Base::Third),
            _ => None,
        }
    }
}

/// Who (by participant id) stands on each base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseOccupancy {
    pub first: Option<i64>,
    pub second: Option<i64>,
    pub third: Option<i64>,
}

impl BaseOccupancy {
    pub fn empty() -> Self {
        BaseOccupancy::default()
    }

    fn set(&mut self, base: Base, runner: Option<i64>) {
        match base {
            Base::First => self.first = runner,
            Base::Second => self.second = runner,
            Base::Third => self.third = runner,
        }
    }

    /// Apply an at-bat's runner movements, in feed order, to this occupancy.
    ///
    /// Each movement vacates its origin base; a runner who is not out and
    /// ends on a base occupies it. Scoring and outs leave no occupant.
    pub fn advance(self, movements: &[RunnerMovement]) -> BaseOccupancy {
        let mut next = self;
        for mv in movements {
            if let Some(start) = mv.start {
                next.set(start, None);
            }
            if mv.is_out {
                continue;
            }
            if let Some(end) = mv.end {
                next.set(end, Some(mv.runner_id));
            }
        }
        next
    }
}
