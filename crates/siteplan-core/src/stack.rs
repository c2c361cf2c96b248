//! Year-by-year deployment records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::equipment::EquipmentConfiguration;

/// What happens to the on-site fleet once the grid connection arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridPolicy {
    /// On-site equipment retires; the grid carries the load plus reserve.
    Replace,
    /// On-site equipment stays; the grid adds capacity.
    ///
    /// The grid is sized to the shortfall, `max(0, load × reserve − thermal)`,
    /// rather than carried over from the base plan's `grid_mw`, so a year
    /// whose thermal fleet already covers the load draws no interconnect.
    Supplement,
}

impl fmt::Display for GridPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridPolicy::Replace => f.write_str("replace"),
            GridPolicy::Supplement => f.write_str("supplement"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackYear {
    pub year: i32,
    pub load_mw: f64,
    pub equipment: EquipmentConfiguration,
    pub lcoe: f64,
    pub grid_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualStack {
    pub base_year: i32,
    pub grid_year: i32,
    pub policy: GridPolicy,
    pub years: Vec<StackYear>,
}

impl AnnualStack {
    pub fn year(&self, year: i32) -> Option<&StackYear> {
        self.years.iter().find(|y| y.year == year)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
