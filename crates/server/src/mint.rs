//! # ミントディスパッチャ
//!
//! Vault宛てのSOL入金に対し、送金元のAssociated Token Accountへ
//! SPLトークンをミントする。
//!
//! ## 手順
//! 1. アドレスのパースとVault宛てであることの確認
//! 2. 入金額(lamports) × 10^decimals を整数演算でスケール
//! 3. 受取人ATAの存在確認（未作成なら冪等作成命令を追加）
//! 4. ミント権限で署名したトランザクションを送信
//! 5. confirmedに達するまで確認状況をポーリング
//!
//! 失敗はリトライせず、ログ出力した上で呼び出し元に返す。

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use vault_mint_types::{MintReceipt, NativeTransfer};

use crate::blockchain::solana_tx::{self, MintTxParams};
use crate::blockchain::{RpcError, SolanaRpc};
use crate::config::{scale_factor, MinterConfig};

/// 確認状況のポーリング間隔
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// ミントエラー型。
#[derive(Debug, thiserror::Error)]
pub enum MintError {
    /// アドレスがBase58の公開鍵として不正
    #[error("不正なアドレス {address}: {reason}")]
    InvalidAddress {
        /// 入力されたアドレス
        address: String,
        /// 理由
        reason: String,
    },
    /// 送金先がVaultではない
    #[error("Vault宛ての送金ではありません: {0}")]
    NotVaultDeposit(String),
    /// 入金額が0
    #[error("ミント量が0です")]
    ZeroAmount,
    /// スケール後の量がu64に収まらない
    #[error("ミント量がオーバーフローします: {amount} lamports × 10^{decimals}")]
    AmountOverflow {
        /// 入金額（lamports）
        amount: u64,
        /// decimals
        decimals: u8,
    },
    /// トランザクション構築に失敗
    #[error("トランザクションの構築に失敗: {0}")]
    Build(String),
    /// Solana RPC呼び出しに失敗
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// トランザクションがオンチェーンで失敗
    #[error("ミントトランザクションが失敗しました ({signature}): {reason}")]
    TransactionFailed {
        /// トランザクション署名
        signature: String,
        /// オンチェーンエラー
        reason: String,
    },
    /// 確認待ちがタイムアウト
    #[error("ミントトランザクションの確認がタイムアウトしました: {0}")]
    ConfirmationTimeout(String),
}

/// ミント要求。Vault宛ての送金レコードからのみ構築される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    /// トークンを受け取るウォレット（SOLの送金元）
    pub recipient: Pubkey,
    /// ミント量（最小単位）
    pub base_unit_amount: u64,
}

impl MintRequest {
    /// 送金レコードからミント要求を構築する。
    ///
    /// `transfer.to_user_account` が `vault` と一致しない場合はエラー。
    pub fn from_transfer(
        transfer: &NativeTransfer,
        vault: &Pubkey,
        decimals: u8,
    ) -> Result<Self, MintError> {
        let destination = parse_address(&transfer.to_user_account)?;
        if destination != *vault {
            return Err(MintError::NotVaultDeposit(transfer.to_user_account.clone()));
        }

        let recipient = parse_address(&transfer.from_user_account)?;
        let base_unit_amount = to_base_units(transfer.amount, decimals)?;

        Ok(Self {
            recipient,
            base_unit_amount,
        })
    }
}

/// lamports を トークン最小単位にスケールする（amount × 10^decimals）。
pub fn to_base_units(amount: u64, decimals: u8) -> Result<u64, MintError> {
    if amount == 0 {
        return Err(MintError::ZeroAmount);
    }
    scale_factor(decimals)
        .and_then(|factor| amount.checked_mul(factor))
        .ok_or(MintError::AmountOverflow { amount, decimals })
}

fn parse_address(address: &str) -> Result<Pubkey, MintError> {
    Pubkey::from_str(address).map_err(|e| MintError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// ミントディスパッチャ。
/// ミント権限の秘密鍵を専有し、外部には公開鍵のみ公開する。
pub struct MintDispatcher {
    /// Solana RPC
    rpc: Arc<dyn SolanaRpc>,
    /// ミント権限キーペア
    authority: Keypair,
    /// Vaultアドレス
    vault: Pubkey,
    /// SPLトークンのミント
    mint: Pubkey,
    /// トークンのdecimals
    decimals: u8,
    /// 確認待ちタイムアウト
    confirm_timeout: Duration,
}

impl MintDispatcher {
    /// 設定とキーペアからディスパッチャを構築する。
    pub fn new(rpc: Arc<dyn SolanaRpc>, authority: Keypair, config: &MinterConfig) -> Self {
        Self {
            rpc,
            authority,
            vault: config.vault_address,
            mint: config.token_mint,
            decimals: config.token_decimals,
            confirm_timeout: config.confirm_timeout,
        }
    }

    /// ミント権限の公開鍵
    pub fn authority_pubkey(&self) -> Pubkey {
        self.authority.pubkey()
    }

    /// SOL入金に対応するトークンをミントする。
    ///
    /// - `recipient`: 入金の送金先（Vaultであること）
    /// - `sender`: 入金の送金元。トークンはこのウォレットのATAにミントされる
    /// - `amount`: 入金額（lamports）
    pub async fn dispatch_mint(
        &self,
        recipient: &str,
        sender: &str,
        amount: u64,
    ) -> Result<MintReceipt, MintError> {
        let transfer = NativeTransfer {
            amount,
            from_user_account: sender.to_string(),
            to_user_account: recipient.to_string(),
        };

        let result = match MintRequest::from_transfer(&transfer, &self.vault, self.decimals) {
            Ok(request) => self.mint_to(&request).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::error!(
                sender = %sender,
                amount,
                error = %e,
                "トークンのミントに失敗"
            );
        }
        result
    }

    /// ミント要求を実行し、confirmedになるまで待つ。
    async fn mint_to(&self, request: &MintRequest) -> Result<MintReceipt, MintError> {
        let token_account = solana_tx::derive_token_account(&request.recipient, &self.mint);

        tracing::info!(
            recipient = %request.recipient,
            token_account = %token_account,
            base_unit_amount = request.base_unit_amount,
            "ミントを開始"
        );

        let create_token_account = !self.rpc.account_exists(&token_account).await?;
        if create_token_account {
            tracing::info!(token_account = %token_account, "ATAが未作成のため作成命令を追加");
        }

        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = solana_tx::build_mint_tx(
            &self.authority,
            &MintTxParams {
                mint: &self.mint,
                recipient: &request.recipient,
                base_unit_amount: request.base_unit_amount,
                decimals: self.decimals,
                create_token_account,
            },
            blockhash,
        )
        .map_err(MintError::Build)?;

        let signature = self.rpc.send_transaction(&tx).await?;
        self.wait_for_confirmation(&signature).await?;

        tracing::info!(signature = %signature, recipient = %request.recipient, "ミント完了");

        Ok(MintReceipt {
            signature: signature.to_string(),
            recipient: request.recipient.to_string(),
            token_account: token_account.to_string(),
            base_unit_amount: request.base_unit_amount,
            created_token_account: create_token_account,
        })
    }

    /// confirmed以上になるか、オンチェーンエラーかタイムアウトまでポーリングする。
    async fn wait_for_confirmation(&self, signature: &Signature) -> Result<(), MintError> {
        let deadline = tokio::time::Instant::now() + self.confirm_timeout;

        loop {
            if let Some(status) = self.rpc.get_signature_status(signature).await? {
                if let Some(reason) = status.err {
                    return Err(MintError::TransactionFailed {
                        signature: signature.to_string(),
                        reason,
                    });
                }
                if status.is_confirmed() {
                    return Ok(());
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(MintError::ConfirmationTimeout(signature.to_string()));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}
