//! # Vault Mint サーバー
//!
//! Vaultアドレスへのネイティブ通貨（SOL）入金をHelius Webhookで受け取り、
//! 送金元のAssociated Token AccountにSPLトークンをミントする。
//!
//! ## API エンドポイント
//! - `POST /helius`: Webhook受信 + ミント
//! - `GET /info`: Vault・トークン・ミント権限の公開情報
//! - `GET /health`: 死活確認

mod blockchain;
mod config;
mod endpoints;
mod error;
mod matcher;
mod mint;

use std::sync::Arc;

use crate::blockchain::HttpSolanaRpc;
use crate::config::{AppState, MinterConfig};
use crate::mint::MintDispatcher;

/// ルーターを構築する。
fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/helius", axum::routing::post(endpoints::handle_helius))
        .route("/info", axum::routing::get(endpoints::handle_info))
        .route("/health", axum::routing::get(endpoints::handle_health))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // .envがあれば読み込む（未存在は無視）
    if let Ok(path) = dotenvy::dotenv() {
        tracing::info!(path = %path.display(), ".envを読み込みました");
    }

    // 設定とミント権限キーペア（不正な鍵はここで起動失敗）
    let (config, authority) = MinterConfig::from_env()?;

    let rpc = HttpSolanaRpc::new(config.solana_rpc_url.clone())?;
    let dispatcher = MintDispatcher::new(Arc::new(rpc), authority, &config);

    tracing::info!(
        vault_address = %config.vault_address,
        token_mint = %config.token_mint,
        mint_authority = %dispatcher.authority_pubkey(),
        token_decimals = config.token_decimals,
        solana_rpc_url = %config.solana_rpc_url,
        webhook_auth = config.helius_auth_header.is_some(),
        "ミント設定"
    );
    if config.helius_auth_header.is_none() {
        tracing::warn!("HELIUS_AUTH_HEADERが未設定です。Webhookの送信元を検証しません");
    }

    let addr = config.listen_addr.clone();
    let state = Arc::new(AppState { config, dispatcher });
    let app = router(state);

    tracing::info!("Vault Mintサーバーを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
