//! # ブロックチェーン連携モジュール
//!
//! Solana RPCへのアクセスを`SolanaRpc`トレイトで抽象化する。
//! JSON-RPC over HTTP実装は `rpc` サブモジュールを参照。

pub mod rpc;
pub mod solana_tx;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use rpc::HttpSolanaRpc;

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// Solana RPCエラー型。
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// HTTP送信・受信に失敗
    #[error("RPC通信に失敗: {0}")]
    Transport(String),
    /// JSON-RPCのerrorオブジェクトが返された
    #[error("RPCがエラーを返しました: {0}")]
    Rpc(String),
    /// resultの形式が想定外
    #[error("RPCレスポンスの形式が不正: {0}")]
    InvalidResponse(String),
}

/// トランザクションの確認状況。
/// `getSignatureStatuses` の1要素に対応する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    /// "processed" | "confirmed" | "finalized"
    pub confirmation_status: Option<String>,
    /// オンチェーン実行エラー（成功時はNone）
    pub err: Option<String>,
}

impl SignatureStatus {
    /// confirmed以上のコミットメントに達しているか。
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.confirmation_status.as_deref(),
            Some("confirmed") | Some("finalized")
        )
    }
}

/// Solana RPCの抽象インターフェース。
///
/// MintDispatcherはこのトレイト経由でのみクラスタと通信する。
#[async_trait::async_trait]
pub trait SolanaRpc: Send + Sync {
    /// 最新のblockhashを取得する。
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError>;

    /// アカウントがオンチェーンに存在するか確認する。
    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError>;

    /// 署名済みトランザクションを送信し、署名を返す。
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, RpcError>;

    /// トランザクションの確認状況を取得する。未発見の場合はNone。
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError>;
}
