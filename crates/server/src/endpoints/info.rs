//! # GET /info, GET /health
//!
//! ミント設定の公開情報と死活確認。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use vault_mint_types::MinterInfo;

use crate::config::AppState;

/// GET /info: Vault・トークン・ミント権限の公開情報を返す。
pub async fn handle_info(State(state): State<Arc<AppState>>) -> Json<MinterInfo> {
    Json(MinterInfo {
        vault_address: state.config.vault_address.to_string(),
        token_mint: state.config.token_mint.to_string(),
        mint_authority: state.dispatcher.authority_pubkey().to_string(),
        token_decimals: state.config.token_decimals,
    })
}

/// GET /health
pub async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
