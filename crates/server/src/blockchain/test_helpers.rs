//! # テスト用モックRPC
//!
//! mint, endpointsテストで共有する`SolanaRpc`のモック実装。

use std::sync::Mutex;

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use super::{RpcError, SignatureStatus, SolanaRpc};

/// `SolanaRpc`のモック。送信されたトランザクションを記録する。
pub struct MockSolanaRpc {
    /// 存在するものとして扱うアカウント
    pub existing_accounts: Vec<Pubkey>,
    /// trueの場合、sendTransactionがRPCエラーを返す
    pub fail_send: bool,
    /// getSignatureStatusesが返す状況（Noneの場合は未発見）
    pub status: Option<SignatureStatus>,
    /// 送信されたトランザクション
    pub sent: Mutex<Vec<Transaction>>,
}

impl MockSolanaRpc {
    /// 常にconfirmedを返すモック。
    pub fn confirming() -> Self {
        Self {
            existing_accounts: vec![],
            fail_send: false,
            status: Some(SignatureStatus {
                confirmation_status: Some("confirmed".to_string()),
                err: None,
            }),
            sent: Mutex::new(vec![]),
        }
    }

    /// 送信されたトランザクションの数。
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// 最後に送信されたトランザクション。
    pub fn last_sent(&self) -> Option<Transaction> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl SolanaRpc for MockSolanaRpc {
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        Ok(Hash::new_unique())
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError> {
        Ok(self.existing_accounts.contains(address))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, RpcError> {
        if self.fail_send {
            return Err(RpcError::Rpc(
                "sendTransaction: Transaction simulation failed".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(tx.clone());
        Ok(tx.signatures[0])
    }

    async fn get_signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        Ok(self.status.clone())
    }
}
