//! Physics areas and the problem-type bitmask.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One physics domain a model can request.
///
/// Also the unit of license gating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsArea {
    Fluid,
    Heat,
    Stress,
    Acoustics,
}

impl PhysicsArea {
    pub const ALL: [PhysicsArea; 4] = [
        PhysicsArea::Fluid,
        PhysicsArea::Heat,
        PhysicsArea::Stress,
        PhysicsArea::Acoustics,
    ];

    pub fn bit(self) -> u32 {
        match self {
            PhysicsArea::Fluid => 1 << 0,
            PhysicsArea::Heat => 1 << 1,
            PhysicsArea::Stress => 1 << 2,
            PhysicsArea::Acoustics => 1 << 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PhysicsArea::Fluid => "fluid",
            PhysicsArea::Heat => "heat",
            PhysicsArea::Stress => "stress",
            PhysicsArea::Acoustics => "acoustics",
        }
    }
}

impl fmt::Display for PhysicsArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of physics areas packed into bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProblemTypeMask(u32);

impl ProblemTypeMask {
    pub const EMPTY: ProblemTypeMask = ProblemTypeMask(0);

    pub fn from_areas(areas: impl IntoIterator<Item = PhysicsArea>) -> Self {
        let mut mask = Self::EMPTY;
        for area in areas {
            mask.insert(area);
        }
        mask
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, area: PhysicsArea) {
        self.0 |= area.bit();
    }

    pub fn contains(self, area: PhysicsArea) -> bool {
        self.0 & area.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Areas in declaration order.
    pub fn areas(self) -> Vec<PhysicsArea> {
        PhysicsArea::ALL
            .into_iter()
            .filter(|area| self.contains(*area))
            .collect()
    }
}

impl fmt::Display for ProblemTypeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.areas().into_iter().map(PhysicsArea::name).collect();
        write!(f, "{}", names.join("+"))
    }
}
