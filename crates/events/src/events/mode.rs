use dlsim_types::Mode;
use serde::{Deserialize, Serialize};

/// System setup and discipline switching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModeEvent {
    /// Registries were (re)built
    Configured {
        processes: usize,
        resources: usize,
        mode: Mode,
    },

    /// The active discipline changed
    Switched { from: Mode, to: Mode },

    /// Banker matrices were rebuilt from the live pools
    BankerReinitialized { processes: usize, resources: usize },
}
