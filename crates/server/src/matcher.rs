//! # 入金レコードの照合
//!
//! Webhookで受け取った送金レコードから、Vault宛ての最初の送金を探す。
//! バッチ配信ではトランザクションごとに照合する。

use vault_mint_types::{HeliusWebhookPayload, NativeTransfer};

/// `to_user_account == vault` を満たす最初のレコードを返す。
/// 該当なしはエラーではない（呼び出し側は何もせず応答する）。
pub fn find_vault_deposit<'a, I>(records: I, vault: &str) -> Option<&'a NativeTransfer>
where
    I: IntoIterator<Item = &'a NativeTransfer>,
{
    records
        .into_iter()
        .find(|transfer| transfer.to_user_account == vault)
}

/// 配信された各トランザクションに`find_vault_deposit`を適用する。
/// 1トランザクションにつき最大1件、配信順に返す。
pub fn find_deposits<'a>(
    payload: &'a HeliusWebhookPayload,
    vault: &str,
) -> Vec<&'a NativeTransfer> {
    payload
        .transactions()
        .iter()
        .filter_map(|tx| find_vault_deposit(&tx.native_transfers, vault))
        .collect()
}
