//! # エンドポイントテスト用共通ヘルパー

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use crate::blockchain::test_helpers::MockSolanaRpc;
use crate::config::{AppState, MinterConfig};
use crate::mint::MintDispatcher;

/// モックRPCを使うテスト用AppStateを構築する。
pub fn test_state(helius_auth_header: Option<&str>) -> (Arc<AppState>, Arc<MockSolanaRpc>) {
    test_state_with_rpc(helius_auth_header, MockSolanaRpc::confirming())
}

/// 任意のモックRPCでテスト用AppStateを構築する。
pub fn test_state_with_rpc(
    helius_auth_header: Option<&str>,
    rpc: MockSolanaRpc,
) -> (Arc<AppState>, Arc<MockSolanaRpc>) {
    let rpc = Arc::new(rpc);
    let config = MinterConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        solana_rpc_url: "http://localhost:8899".to_string(),
        vault_address: Pubkey::new_unique(),
        token_mint: Pubkey::new_unique(),
        token_decimals: 9,
        helius_auth_header: helius_auth_header.map(str::to_string),
        confirm_timeout: Duration::from_secs(1),
    };
    let dispatcher = MintDispatcher::new(rpc.clone(), Keypair::new(), &config);

    (Arc::new(AppState { config, dispatcher }), rpc)
}
