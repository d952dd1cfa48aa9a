//! Equipment Identity Register decision engine: the TAC-range and
//! IMEI-prefix stores, the colour verdict type, and the operations
//! (`CheckTac`, `CheckImei`, `InsertTac`, `InsertImei`, and their removal
//! counterparts) that the Diameter and HTTP front ends in `eir-daemon` call
//! into.

/// Initialize logging with the given default level. Respects `RUST_LOG`
/// overrides via `parse_default_env`.
pub fn init_logging(default_level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();
}

pub mod audit;
pub mod colour;
pub mod config;
pub mod engine;
pub mod range;
pub mod store;

pub use colour::Colour;
pub use config::EngineConfig;
pub use engine::{CheckResult, DecisionEngine, DecisionError, SystemLoad};
pub use store::{InMemoryRangeStore, RangeRepository, StoreError};
