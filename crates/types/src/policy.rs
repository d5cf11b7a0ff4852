//! Victim-selection policy names shared by config, engine and CLI

use dlsim_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which process in a detected cycle is terminated to break it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictimPolicyKind {
    /// First process of the cycle as reported by the search
    #[default]
    FirstInCycle,
    /// Process holding the fewest units; ties go to cycle order
    LowestHoldings,
}

impl VictimPolicyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstInCycle => "first_in_cycle",
            Self::LowestHoldings => "lowest_holdings",
        }
    }
}

impl fmt::Display for VictimPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VictimPolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "first_in_cycle" => Ok(Self::FirstInCycle),
            "lowest_holdings" => Ok(Self::LowestHoldings),
            _ => Err(ConfigError::InvalidValue {
                field: "victim_policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl clap::ValueEnum for VictimPolicyKind {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::FirstInCycle, Self::LowestHoldings]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::FirstInCycle => clap::builder::PossibleValue::new("first-in-cycle"),
            Self::LowestHoldings => clap::builder::PossibleValue::new("lowest-holdings"),
        })
    }
}
