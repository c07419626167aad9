//! # Vault Mint 共有型定義
//!
//! Webhook受信からトークンミントまでの間で受け渡されるデータ構造。
//!
//! ## エンコーディング規則
//! - Base58: Solanaアドレス、トランザクション署名
//! - 金額: lamports / トークン最小単位の整数（u64）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Helius Webhook ペイロード
// ---------------------------------------------------------------------------

/// ネイティブ通貨（SOL）の送金レコード。
/// Helius Enhanced Transactionの`nativeTransfers`要素に対応する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    /// 送金額（lamports）
    pub amount: u64,
    /// 送金元アドレス（Base58）
    pub from_user_account: String,
    /// 送金先アドレス（Base58）
    pub to_user_account: String,
}

/// Helius Enhanced Transaction のうち、本サービスが参照するフィールド。
/// それ以外のフィールドは無視する。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeliusTransaction {
    /// トランザクション署名（Base58）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// ネイティブ送金の一覧（配信順）
    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,
}

/// POST /helius のリクエストボディ。
///
/// Heliusは通常トランザクションの配列を送るが、単一オブジェクトも受け付ける。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeliusWebhookPayload {
    /// トランザクション配列
    Batch(Vec<HeliusTransaction>),
    /// 単一トランザクション
    Single(HeliusTransaction),
}

impl HeliusWebhookPayload {
    /// 配信されたトランザクションを配信順に返す。単一形式は長さ1。
    pub fn transactions(&self) -> &[HeliusTransaction] {
        match self {
            HeliusWebhookPayload::Batch(txs) => txs,
            HeliusWebhookPayload::Single(tx) => std::slice::from_ref(tx),
        }
    }
}

// ---------------------------------------------------------------------------
// レスポンス
// ---------------------------------------------------------------------------

/// ミント完了時の受領情報。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// ミントトランザクションの署名（Base58）
    pub signature: String,
    /// トークンを受け取ったウォレット（SOLの送金元）
    pub recipient: String,
    /// 受取人のAssociated Token Account
    pub token_account: String,
    /// ミントしたトークン量（最小単位）
    pub base_unit_amount: u64,
    /// このトランザクションでATAを作成したか
    pub created_token_account: bool,
}

/// POST /helius のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// 処理結果メッセージ
    pub message: String,
    /// ミントした受領情報（トランザクションの配信順）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receipts: Vec<MintReceipt>,
}

/// GET /info のレスポンス。秘密鍵は含まない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinterInfo {
    /// Vaultアドレス（Base58）
    pub vault_address: String,
    /// ミント対象のSPLトークン（Base58）
    pub token_mint: String,
    /// ミント権限を持つ公開鍵（Base58）
    pub mint_authority: String,
    /// トークンのdecimals
    pub token_decimals: u8,
}
