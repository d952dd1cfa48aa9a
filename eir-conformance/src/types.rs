//! Wire shapes returned by the HTTP façade, mirrored here rather than
//! shared via a path dependency on `eir-daemon` so the harness only talks
//! to the running daemon over the network, never its crate internals.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub problem_type: String,
    #[allow(dead_code)]
    pub title: String,
    pub status: u16,
    #[allow(dead_code)]
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct InsertTacBody {
    pub start_range_tac: String,
    pub end_range_tac: Option<String>,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct InsertImeiBody {
    pub imei: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct TacRangeBody {
    pub key: String,
    #[allow(dead_code)]
    pub colour: String,
}
