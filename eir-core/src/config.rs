use serde::{Deserialize, Serialize};

/// The handful of size limits the Decision Engine and Range Store need.
/// Lives in `eir-core` (rather than the daemon's broader `Config`) because
/// `InMemoryRangeStore` and `DecisionEngine` are usable as a library without
/// ever touching a socket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed width for TAC key padding.
    pub tac_max_length: usize,
    /// Prefix width for the IMEI exact store.
    pub imei_check_length: usize,
    /// Maximum input length accepted by InsertImei.
    pub imei_max_length: usize,
    /// Whether a `CheckTac`/`CheckImei` miss (colour `unknown`) should be
    /// reported to S13 callers as WHITELISTED (the spec's stated default) or
    /// treated as a hard failure by the caller.
    pub default_policy_unknown_is_whitelisted: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tac_max_length: 16,
            imei_check_length: 14,
            imei_max_length: 16,
            default_policy_unknown_is_whitelisted: true,
        }
    }
}
