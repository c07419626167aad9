//! # POST /helius
//!
//! Helius Webhookの受信。Vault宛てのSOL入金を見つけたら、
//! 送金元にSPLトークンをミントする。
//!
//! バッチ配信ではトランザクションごとに最初のVault宛て送金をミントする。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use subtle::ConstantTimeEq;
use vault_mint_types::{HeliusWebhookPayload, WebhookResponse};

use crate::config::AppState;
use crate::error::WebhookError;
use crate::matcher;

/// 該当送金がない場合の応答メッセージ
pub const MESSAGE_PROCESSED: &str = "Processed";
/// ミント成功時の応答メッセージ
pub const MESSAGE_MINTED: &str = "Transaction successful";

/// POST /helius: Webhook受信とミント。
///
/// - Vault宛て送金なし（または入金額がすべて0）: 200 "Processed"
/// - ミント成功: 200 + 受領情報（トランザクションの配信順）
/// - ミント失敗: `WebhookError`のステータスコード。Heliusに再送させるため、
///   一部のミントが完了していても成功として応答しない。
/// - ボディ不正: `{ message }`形式の4xx
///
/// 各ミントの完了（confirmed）を待ってから応答する。
pub async fn handle_helius(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<HeliusWebhookPayload>, JsonRejection>,
) -> Result<Json<WebhookResponse>, WebhookError> {
    if let Some(expected) = state.config.helius_auth_header.as_deref() {
        let provided = headers
            .get(header::AUTHORIZATION)
            .map(|v| v.as_bytes())
            .unwrap_or_default();
        if !bool::from(provided.ct_eq(expected.as_bytes())) {
            tracing::warn!("Authorizationヘッダーが一致しません");
            return Err(WebhookError::Unauthorized);
        }
    }

    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Webhookペイロードを解釈できません");
        WebhookError::from(rejection)
    })?;

    let vault = state.config.vault_address.to_string();
    let deposits = matcher::find_deposits(&payload, &vault);
    if deposits.is_empty() {
        tracing::debug!("Vault宛ての送金はありません");
        return Ok(processed());
    }

    let mut receipts = Vec::with_capacity(deposits.len());
    for deposit in deposits {
        if deposit.amount == 0 {
            tracing::info!(sender = %deposit.from_user_account, "入金額が0のためミントしません");
            continue;
        }

        tracing::info!(
            sender = %deposit.from_user_account,
            amount = deposit.amount,
            "Vaultへの入金を検出"
        );

        let result = state
            .dispatcher
            .dispatch_mint(
                &deposit.to_user_account,
                &deposit.from_user_account,
                deposit.amount,
            )
            .await;

        match result {
            Ok(receipt) => receipts.push(receipt),
            Err(e) => {
                if !receipts.is_empty() {
                    tracing::warn!(
                        minted = receipts.len(),
                        "同一配信内の先行ミントは完了済みです。再送時に重複する可能性があります"
                    );
                }
                return Err(e.into());
            }
        }
    }

    if receipts.is_empty() {
        return Ok(processed());
    }

    Ok(Json(WebhookResponse {
        message: MESSAGE_MINTED.to_string(),
        receipts,
    }))
}

fn processed() -> Json<WebhookResponse> {
    Json(WebhookResponse {
        message: MESSAGE_PROCESSED.to_string(),
        receipts: vec![],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use solana_sdk::pubkey::Pubkey;
    use vault_mint_types::{HeliusTransaction, NativeTransfer};

    use crate::blockchain::solana_tx::derive_token_account;
    use crate::blockchain::test_helpers::MockSolanaRpc;
    use crate::endpoints::test_helpers::{test_state, test_state_with_rpc};

    fn single(transfers: Vec<NativeTransfer>) -> HeliusWebhookPayload {
        HeliusWebhookPayload::Single(HeliusTransaction {
            signature: None,
            native_transfers: transfers,
        })
    }

    fn deposit(amount: u64, from: &Pubkey, to: &Pubkey) -> NativeTransfer {
        NativeTransfer {
            amount,
            from_user_account: from.to_string(),
            to_user_account: to.to_string(),
        }
    }

    /// Vault宛て送金 → 送金元ATAへのミントが実行されることを確認
    #[tokio::test]
    async fn test_deposit_mints_to_sender() {
        let (state, rpc) = test_state(None);
        let vault = state.config.vault_address;
        let sender = Pubkey::new_unique();

        let result = handle_helius(
            State(state.clone()),
            HeaderMap::new(),
            Ok(Json(single(vec![deposit(10_000_000, &sender, &vault)]))),
        )
        .await;

        assert!(result.is_ok(), "handle_helius failed: {:?}", result.err());
        let response = result.unwrap().0;
        assert_eq!(response.message, MESSAGE_MINTED);

        assert_eq!(response.receipts.len(), 1);
        let receipt = &response.receipts[0];
        assert_eq!(receipt.recipient, sender.to_string());
        assert_eq!(receipt.base_unit_amount, 10_000_000_000_000_000);
        assert_eq!(
            receipt.token_account,
            derive_token_account(&sender, &state.config.token_mint).to_string()
        );
        assert_eq!(rpc.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_transfers_acknowledged() {
        let (state, rpc) = test_state(None);

        let response = handle_helius(State(state), HeaderMap::new(), Ok(Json(single(vec![]))))
            .await
            .unwrap()
            .0;

        assert_eq!(response.message, MESSAGE_PROCESSED);
        assert!(response.receipts.is_empty());
        assert_eq!(rpc.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_other_destination_ignored() {
        let (state, rpc) = test_state(None);
        let other = Pubkey::new_unique();

        let response = handle_helius(
            State(state),
            HeaderMap::new(),
            Ok(Json(single(vec![deposit(1_000, &Pubkey::new_unique(), &other)]))),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(response.message, MESSAGE_PROCESSED);
        assert_eq!(rpc.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_amount_not_minted() {
        let (state, rpc) = test_state(None);
        let vault = state.config.vault_address;

        let response = handle_helius(
            State(state),
            HeaderMap::new(),
            Ok(Json(single(vec![deposit(0, &Pubkey::new_unique(), &vault)]))),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(response.message, MESSAGE_PROCESSED);
        assert_eq!(rpc.sent_count(), 0);
    }

    /// RPC失敗が成功として応答されないことを確認
    #[tokio::test]
    async fn test_mint_failure_is_not_success() {
        let mut mock = MockSolanaRpc::confirming();
        mock.fail_send = true;
        let (state, _rpc) = test_state_with_rpc(None, mock);
        let vault = state.config.vault_address;

        let result = handle_helius(
            State(state),
            HeaderMap::new(),
            Ok(Json(single(vec![deposit(5, &Pubkey::new_unique(), &vault)]))),
        )
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_amount_overflow_rejected() {
        let (state, rpc) = test_state(None);
        let vault = state.config.vault_address;

        let result = handle_helius(
            State(state),
            HeaderMap::new(),
            Ok(Json(single(vec![deposit(u64::MAX, &Pubkey::new_unique(), &vault)]))),
        )
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(rpc.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_auth_header_required() {
        let (state, rpc) = test_state(Some("webhook-secret"));
        let vault = state.config.vault_address;
        let payload = single(vec![deposit(5, &Pubkey::new_unique(), &vault)]);

        // ヘッダーなし → 401
        let result =
            handle_helius(State(state.clone()), HeaderMap::new(), Ok(Json(payload.clone()))).await;
        assert!(matches!(result, Err(WebhookError::Unauthorized)));

        // 値が異なる → 401
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("wrong"));
        let result = handle_helius(State(state.clone()), headers, Ok(Json(payload.clone()))).await;
        assert!(matches!(result, Err(WebhookError::Unauthorized)));
        assert_eq!(rpc.sent_count(), 0);

        // 一致 → ミント実行
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("webhook-secret"));
        let result = handle_helius(State(state), headers, Ok(Json(payload))).await;
        assert!(result.is_ok(), "handle_helius failed: {:?}", result.err());
        assert_eq!(rpc.sent_count(), 1);
    }

    /// バッチ配信ではトランザクションごとにVault宛て送金をミントすることを確認
    #[tokio::test]
    async fn test_batch_mints_each_transaction() {
        let (state, rpc) = test_state(None);
        let vault = state.config.vault_address;
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();
        let third = Pubkey::new_unique();

        let payload = HeliusWebhookPayload::Batch(vec![
            HeliusTransaction {
                signature: Some("a".to_string()),
                native_transfers: vec![deposit(3, &Pubkey::new_unique(), &Pubkey::new_unique())],
            },
            HeliusTransaction {
                signature: Some("b".to_string()),
                native_transfers: vec![deposit(1, &first, &vault), deposit(7, &third, &vault)],
            },
            HeliusTransaction {
                signature: Some("c".to_string()),
                native_transfers: vec![deposit(2, &second, &vault)],
            },
        ]);

        let response = handle_helius(State(state), HeaderMap::new(), Ok(Json(payload)))
            .await
            .unwrap()
            .0;

        assert_eq!(response.message, MESSAGE_MINTED);
        let minted: Vec<_> = response
            .receipts
            .iter()
            .map(|r| (r.recipient.clone(), r.base_unit_amount))
            .collect();
        assert_eq!(
            minted,
            vec![
                (first.to_string(), 1_000_000_000),
                (second.to_string(), 2_000_000_000),
            ]
        );
        assert_eq!(rpc.sent_count(), 2);
    }

    /// バッチ内の後続ミントが失敗した場合は成功として応答しないことを確認
    #[tokio::test]
    async fn test_batch_later_failure_is_not_success() {
        let (state, rpc) = test_state(None);
        let vault = state.config.vault_address;

        let payload = HeliusWebhookPayload::Batch(vec![
            HeliusTransaction {
                signature: Some("a".to_string()),
                native_transfers: vec![deposit(1, &Pubkey::new_unique(), &vault)],
            },
            HeliusTransaction {
                signature: Some("b".to_string()),
                native_transfers: vec![deposit(u64::MAX, &Pubkey::new_unique(), &vault)],
            },
        ]);

        let result = handle_helius(State(state), HeaderMap::new(), Ok(Json(payload))).await;

        let error = result.unwrap_err();
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(rpc.sent_count(), 1);
    }

    /// 入金額0のトランザクションは飛ばし、他のトランザクションはミントすることを確認
    #[tokio::test]
    async fn test_batch_skips_zero_amount() {
        let (state, rpc) = test_state(None);
        let vault = state.config.vault_address;
        let sender = Pubkey::new_unique();

        let payload = HeliusWebhookPayload::Batch(vec![
            HeliusTransaction {
                signature: None,
                native_transfers: vec![deposit(0, &Pubkey::new_unique(), &vault)],
            },
            HeliusTransaction {
                signature: None,
                native_transfers: vec![deposit(4, &sender, &vault)],
            },
        ]);

        let response = handle_helius(State(state), HeaderMap::new(), Ok(Json(payload)))
            .await
            .unwrap()
            .0;

        assert_eq!(response.receipts.len(), 1);
        assert_eq!(response.receipts[0].recipient, sender.to_string());
        assert_eq!(rpc.sent_count(), 1);
    }
}
