//! Engine tuning knobs.

use std::time::Duration;

/// How long one fan-out gather waits for creator responses before proceeding
/// with whatever completed.
pub const DEFAULT_FANOUT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Iteration cap for plan resolution. Plans may need many layers of
/// recursive expansion: resolving one node can reveal new child nodes.
pub const DEFAULT_PLAN_MAX_DEPTH: u32 = 10;

/// Iteration cap for filter resolution. Filters are expected to resolve in a
/// single pass.
pub const DEFAULT_FILTER_MAX_DEPTH: u32 = 1;

/// Per-request engine configuration.
///
/// Callers normally use [`EngineConfig::default`]; the fields exist so the
/// surrounding service can shorten the gather timeout in tests or raise the
/// plan depth cap for unusually deep documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Wall-clock bound on one fan-out gather.
    pub fanout_timeout: Duration,

    /// Hard cap on fan-out/merge iterations for plan resolution.
    pub plan_max_depth: u32,

    /// Hard cap on fan-out/merge iterations for filter resolution.
    pub filter_max_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fanout_timeout: DEFAULT_FANOUT_TIMEOUT,
            plan_max_depth: DEFAULT_PLAN_MAX_DEPTH,
            filter_max_depth: DEFAULT_FILTER_MAX_DEPTH,
        }
    }
}
