//! # Webhook エラー型

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use vault_mint_types::WebhookResponse;

use crate::mint::MintError;

/// Webhookエンドポイントのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Authorizationヘッダーが不一致
    #[error("Webhook認証に失敗しました")]
    Unauthorized,
    /// リクエストボディがWebhookペイロードとして解釈できない
    #[error("リクエストボディが不正です: {0}")]
    InvalidPayload(#[from] JsonRejection),
    /// ミントに失敗
    #[error(transparent)]
    Mint(#[from] MintError),
}

impl WebhookError {
    fn status(&self) -> StatusCode {
        match self {
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(rejection) => rejection.status(),
            WebhookError::Mint(e) => match e {
                MintError::InvalidAddress { .. }
                | MintError::NotVaultDeposit(_)
                | MintError::ZeroAmount
                | MintError::AmountOverflow { .. } => StatusCode::BAD_REQUEST,
                MintError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
                MintError::Rpc(_) | MintError::TransactionFailed { .. } => StatusCode::BAD_GATEWAY,
                MintError::ConfirmationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            },
        }
    }
}

impl axum::response::IntoResponse for WebhookError {
    fn into_response(self) -> axum::response::Response {
        let body = WebhookResponse {
            message: self.to_string(),
            receipts: vec![],
        };
        (self.status(), Json(body)).into_response()
    }
}
