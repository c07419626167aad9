//! # Solana JSON-RPC クライアント
//!
//! reqwestでSolana RPCエンドポイントにJSON-RPC 2.0リクエストを送る
//! `SolanaRpc`実装。トランザクションはbincode + Base64で送信する。

use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use super::{RpcError, SignatureStatus, SolanaRpc};

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// HTTP経由のSolana RPCクライアント。
pub struct HttpSolanaRpc {
    /// RPCエンドポイントURL
    rpc_url: String,
    /// HTTPクライアント
    http_client: reqwest::Client,
    /// 問い合わせに使うコミットメント
    commitment: String,
}

impl HttpSolanaRpc {
    /// RPC URLからクライアントを構築する。コミットメントは"confirmed"。
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, RpcError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RpcError::Transport(format!("HTTPクライアントの構築に失敗: {e}")))?;

        Ok(Self {
            rpc_url: rpc_url.into(),
            http_client,
            commitment: "confirmed".to_string(),
        })
    }

    /// JSON-RPCメソッドを呼び出し、`result`フィールドを返す。
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let rpc_request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let rpc_response = self
            .http_client
            .post(&self.rpc_url)
            .json(&rpc_request)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{method} の送信に失敗: {e}")))?;

        let status = rpc_response.status();
        let rpc_body: serde_json::Value = rpc_response
            .json()
            .await
            .map_err(|e| RpcError::Transport(format!("{method} のレスポンスのパースに失敗: {e}")))?;

        if let Some(error) = rpc_body.get("error") {
            return Err(RpcError::Rpc(format!("{method}: {error}")));
        }

        if !status.is_success() {
            return Err(RpcError::Transport(format!("{method}: HTTP {status}")));
        }

        rpc_body
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method} にresultがありません")))
    }
}

#[async_trait::async_trait]
impl SolanaRpc for HttpSolanaRpc {
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        let result = self
            .call(
                "getLatestBlockhash",
                serde_json::json!([{ "commitment": self.commitment }]),
            )
            .await?;

        let blockhash = result
            .pointer("/value/blockhash")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RpcError::InvalidResponse("blockhashがありません".to_string()))?;

        Hash::from_str(blockhash)
            .map_err(|e| RpcError::InvalidResponse(format!("blockhashのデコードに失敗: {e}")))
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError> {
        let result = self
            .call(
                "getAccountInfo",
                serde_json::json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await?;

        let value = result.get("value").ok_or_else(|| {
            RpcError::InvalidResponse("getAccountInfo にvalueがありません".to_string())
        })?;

        Ok(!value.is_null())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, RpcError> {
        let tx_bytes = bincode::serialize(tx).map_err(|e| {
            RpcError::InvalidResponse(format!("トランザクションのシリアライズに失敗: {e}"))
        })?;
        let tx_b64 = b64().encode(&tx_bytes);

        let result = self
            .call(
                "sendTransaction",
                serde_json::json!([
                    tx_b64,
                    { "encoding": "base64", "preflightCommitment": self.commitment }
                ]),
            )
            .await?;

        let tx_sig = result.as_str().ok_or_else(|| {
            RpcError::InvalidResponse("sendTransaction のresultが文字列ではありません".to_string())
        })?;

        Signature::from_str(tx_sig)
            .map_err(|e| RpcError::InvalidResponse(format!("署名のデコードに失敗: {e}")))
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        let result = self
            .call(
                "getSignatureStatuses",
                serde_json::json!([[signature.to_string()], { "searchTransactionHistory": false }]),
            )
            .await?;

        let entry = result.pointer("/value/0").ok_or_else(|| {
            RpcError::InvalidResponse("getSignatureStatuses にvalueがありません".to_string())
        })?;

        if entry.is_null() {
            return Ok(None);
        }

        let confirmation_status = entry
            .get("confirmationStatus")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let err = entry
            .get("err")
            .filter(|v| !v.is_null())
            .map(|v| v.to_string());

        Ok(Some(SignatureStatus {
            confirmation_status,
            err,
        }))
    }
}
