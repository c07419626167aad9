//! # サーバー設定・共有状態
//!
//! 環境変数からの設定読み込みとサーバーの共有状態の定義。
//! 設定は起動時に一度だけ読み込み、以降は変更しない。

use std::str::FromStr;
use std::time::Duration;

use base58::FromBase58;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use crate::mint::MintDispatcher;

/// RPC URLの既定値（devnet）
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.devnet.solana.com";
/// 待ち受けアドレスの既定値
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
/// トークンdecimalsの既定値
pub const DEFAULT_TOKEN_DECIMALS: u8 = 9;
/// 確認待ちタイムアウトの既定値（秒）
pub const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 30;

/// 設定エラー型。いずれも起動を中断する。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0}が設定されていません")]
    Missing(&'static str),
    /// 値の形式が不正
    #[error("{name}の値が不正です: {reason}")]
    InvalidValue {
        /// 環境変数名
        name: &'static str,
        /// 理由
        reason: String,
    },
    /// ミント権限の秘密鍵をデコードできない
    #[error("MINT_AUTHORITY_KEYのデコードに失敗: {0}")]
    KeyDecode(String),
}

/// サーバー設定。
/// 秘密鍵は含まない（`MintDispatcher`が専有する）。
pub struct MinterConfig {
    /// 待ち受けアドレス
    pub listen_addr: String,
    /// Solana RPC URL
    pub solana_rpc_url: String,
    /// SOLの入金先となるVaultアドレス
    pub vault_address: Pubkey,
    /// ミント対象のSPLトークン
    pub token_mint: Pubkey,
    /// トークンのdecimals（入金額のスケール指数）
    pub token_decimals: u8,
    /// Webhookの`Authorization`ヘッダーに期待する値。Noneの場合は検証しない。
    pub helius_auth_header: Option<String>,
    /// ミントトランザクションの確認待ちタイムアウト
    pub confirm_timeout: Duration,
}

impl MinterConfig {
    /// 環境変数から設定とミント権限キーペアを読み込む。
    pub fn from_env() -> Result<(Self, Keypair), ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の変数ルックアップから設定を構築する。
    pub fn from_lookup<F>(lookup: F) -> Result<(Self, Keypair), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let vault_address = parse_pubkey("VAULT_ADDRESS", &required("VAULT_ADDRESS")?)?;
        let token_mint = parse_pubkey("TOKEN_MINT_ADDRESS", &required("TOKEN_MINT_ADDRESS")?)?;
        let authority = decode_keypair(&required("MINT_AUTHORITY_KEY")?)?;

        let token_decimals = match lookup("TOKEN_DECIMALS") {
            Some(v) => v.trim().parse::<u8>().map_err(|e| ConfigError::InvalidValue {
                name: "TOKEN_DECIMALS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TOKEN_DECIMALS,
        };
        // u64に収まるスケールのみ許可
        if scale_factor(token_decimals).is_none() {
            return Err(ConfigError::InvalidValue {
                name: "TOKEN_DECIMALS",
                reason: format!("10^{token_decimals} がu64に収まりません"),
            });
        }

        let confirm_timeout_secs = match lookup("CONFIRM_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                name: "CONFIRM_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_CONFIRM_TIMEOUT_SECS,
        };

        let config = Self {
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            solana_rpc_url: lookup("SOLANA_RPC_URL")
                .unwrap_or_else(|| DEFAULT_SOLANA_RPC_URL.to_string()),
            vault_address,
            token_mint,
            token_decimals,
            helius_auth_header: lookup("HELIUS_AUTH_HEADER").filter(|v| !v.is_empty()),
            confirm_timeout: Duration::from_secs(confirm_timeout_secs),
        };

        Ok((config, authority))
    }
}

/// 10^decimals を返す。u64に収まらない場合はNone。
pub fn scale_factor(decimals: u8) -> Option<u64> {
    10u64.checked_pow(u32::from(decimals))
}

/// Base58の公開鍵をパースする。
fn parse_pubkey(name: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim()).map_err(|e| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
    })
}

/// 秘密鍵文字列をキーペアにデコードする。
///
/// 受け付ける形式:
/// - Base58エンコードされた64バイトの秘密鍵（ウォレットのエクスポート形式）
/// - JSONのバイト配列（`solana-keygen`のキーファイル形式）
pub fn decode_keypair(encoded: &str) -> Result<Keypair, ConfigError> {
    let trimmed = encoded.trim();

    let bytes: Vec<u8> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| ConfigError::KeyDecode(format!("JSON配列のパースに失敗: {e}")))?
    } else {
        trimmed
            .from_base58()
            .map_err(|e| ConfigError::KeyDecode(format!("Base58デコードに失敗: {e:?}")))?
    };

    Keypair::try_from(bytes.as_slice()).map_err(|e| {
        ConfigError::KeyDecode(format!("64バイトのEd25519キーペアではありません: {e}"))
    })
}

/// サーバーの共有状態。
pub struct AppState {
    /// 起動時に読み込んだ設定
    pub config: MinterConfig,
    /// ミントディスパッチャ（秘密鍵を専有）
    pub dispatcher: MintDispatcher,
}
