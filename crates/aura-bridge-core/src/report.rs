//! Execution report returned as the JSON body of every response

use crate::Engine;
use serde::Serialize;

/// Fabricated result of a build/run
///
/// Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub status: &'static str,
    pub engine: &'static str,
    pub latency_ms: u64,
    pub exit_code: i32,
    pub stdout: String,
}

impl ExecutionReport {
    /// Successful report for `engine` on `port`
    pub fn success(engine: Engine, port: u16, latency_ms: u64) -> Self {
        Self {
            status: "success",
            engine: engine.as_str(),
            latency_ms,
            exit_code: 0,
            stdout: engine.canned_output(port),
        }
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
