//! Read-only view of the simulation consumed by drivers and renderers

use crate::{Mode, ProcessId, ProcessState, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-resource unit mapping
pub type Units<K> = BTreeMap<K, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessView {
    pub state: ProcessState,
    pub held: Units<ResourceId>,
    /// Resources in the order they were first acquired
    pub holding: Vec<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_for: Option<(ResourceId, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requesting: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub maximum_demand: Units<ResourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceView {
    pub total: u32,
    pub available: u32,
    pub allocated: Units<ProcessId>,
}

/// One entry of the FIFO waiting queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingView {
    pub process: ProcessId,
    pub resource: ResourceId,
    pub units: u32,
}

/// Banker matrices, present only while avoidance mode is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankerView {
    pub available: Units<ResourceId>,
    pub allocation: BTreeMap<ProcessId, Units<ResourceId>>,
    pub need: BTreeMap<ProcessId, Units<ResourceId>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub requests: u64,
    pub grants: u64,
    pub denials: u64,
    pub waits: u64,
    pub deadlocks: u64,
    pub recoveries: u64,
    pub preventions: u64,
    pub avoidances: u64,
    pub releases: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub step: u64,
    pub processes: BTreeMap<ProcessId, ProcessView>,
    pub resources: BTreeMap<ResourceId, ResourceView>,
    pub waiting_queue: Vec<WaitingView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banker: Option<BankerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<Vec<ProcessId>>,
    pub victim_policy: String,
    pub counters: Counters,
}
