//! # Solanaトランザクション構築ヘルパー
//!
//! SPL Tokenのミントトランザクションを構築する。
//! spl-token / spl-associated-token-account-client の命令ビルダーを使用する。

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};
use spl_associated_token_account_client::address::get_associated_token_address_with_program_id;
use spl_associated_token_account_client::instruction::create_associated_token_account_idempotent;

// ---------------------------------------------------------------------------
// ATA導出
// ---------------------------------------------------------------------------

/// ウォレットとミントに対応するAssociated Token Accountを導出する。
/// seeds = [wallet, token_program, mint], program = Associated Token Account
pub fn derive_token_account(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(wallet, mint, &spl_token::id())
}

// ---------------------------------------------------------------------------
// mint トランザクション構築
// ---------------------------------------------------------------------------

/// ミント対象の指定。
pub struct MintTxParams<'a> {
    /// SPLトークンのミントアドレス
    pub mint: &'a Pubkey,
    /// トークンを受け取るウォレット
    pub recipient: &'a Pubkey,
    /// ミント量（最小単位）
    pub base_unit_amount: u64,
    /// ミントのdecimals（mint_to_checkedで検証される）
    pub decimals: u8,
    /// ATAが未作成の場合true。冪等作成命令を先頭に追加する。
    pub create_token_account: bool,
}

/// SPL Token ミントトランザクションを構築し、ミント権限で署名する。
///
/// トランザクションに含まれる命令:
/// 1. (任意) associated_token_account::create_idempotent: 受取人ATAの作成
/// 2. spl_token::mint_to_checked: 受取人ATAへのミント
///
/// 署名者: authority のみ（fee payer + ミント権限 + ATA作成費用の支払者）。
/// マルチシグの共同署名者は付けない。
pub fn build_mint_tx(
    authority: &Keypair,
    params: &MintTxParams<'_>,
    blockhash: Hash,
) -> Result<Transaction, String> {
    let authority_pubkey = authority.pubkey();
    let token_account = derive_token_account(params.recipient, params.mint);

    let mut instructions: Vec<Instruction> = Vec::with_capacity(2);

    if params.create_token_account {
        instructions.push(create_associated_token_account_idempotent(
            &authority_pubkey,
            params.recipient,
            params.mint,
            &spl_token::id(),
        ));
    }

    let mint_ix = spl_token::instruction::mint_to_checked(
        &spl_token::id(),
        params.mint,
        &token_account,
        &authority_pubkey,
        &[],
        params.base_unit_amount,
        params.decimals,
    )
    .map_err(|e| format!("mint_to_checked命令の構築に失敗: {e}"))?;
    instructions.push(mint_ix);

    Ok(Transaction::new_signed_with_payer(
        &instructions,
        Some(&authority_pubkey),
        &[authority],
        blockhash,
    ))
}
