//! Response types (Serialize)

use keendreams_service::StorageStats;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub success: bool,
    pub dream_id: String,
    pub message: &'static str,
    pub quality_score: u8,
    pub storage_used: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateResponse {
    pub success: bool,
    pub message: &'static str,
    pub existing_dream_id: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatsResponse {
    pub success: bool,
    pub message: &'static str,
    pub stats: StorageStats,
    pub source: String,
    pub timestamp: String,
}
