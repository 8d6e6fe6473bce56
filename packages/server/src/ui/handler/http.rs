//! HTTP API エンドポイントのハンドラ

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::BrokerStateDto, ui::state::AppState};

/// 現在のブローカー状態を返すデバッグ用エンドポイント
pub async fn debug_broker_state(State(state): State<Arc<AppState>>) -> Json<BrokerStateDto> {
    let snapshot = state.get_broker_state_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(BrokerStateDto::from_snapshot(
        snapshot,
        state.clock.now_millis(),
    ))
}

/// ヘルスチェック用エンドポイント
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
