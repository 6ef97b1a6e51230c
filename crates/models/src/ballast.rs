use serde::{Deserialize, Serialize};

/// Body of `GET /`. The `tip` field points operators at the companion
/// tooling used to observe the effect of the pool from outside the
/// container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolStatus {
    pub allocated_mb: u64,
    pub groups: usize,
    pub tip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddBallastResponse {
    pub ok: bool,
    pub added_mb: u64,
    pub chunk_mb: u64,
    pub total_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetBallastResponse {
    pub ok: bool,
    pub total_mb: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreeBallastResponse {
    pub ok: bool,
    pub freed_request_mb: u64,
    pub total_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClearBallastResponse {
    pub ok: bool,
    pub total_mb: u64,
}
