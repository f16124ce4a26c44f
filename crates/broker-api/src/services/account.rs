//! 계좌 서비스.
//!
//! 저장된 자격증명을 복호화해 KIS 클라이언트를 구성하고,
//! 대시보드 계좌 요약을 만듭니다.

use crate::error::ApiError;
use crate::state::AppState;
use broker_core::mask::mask_value;
use broker_exchange::{KisConfig, KisKrClient, KisUsClient};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 대시보드 계좌 요약.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    /// 총 평가금액
    pub total_asset: Decimal,
    /// 예수금
    pub deposit: Decimal,
    /// 평가손익
    pub profit_loss: Decimal,
    /// 수익률 (%), 매입금액이 0 이하면 null
    pub profit_rate: Option<Decimal>,
    /// 보유 종목 수
    pub stock_count: usize,
}

/// 계좌 서비스.
pub struct AccountService;

impl AccountService {
    /// 사용자의 자격증명을 복호화해 KIS 설정 구성.
    ///
    /// 자격증명이 등록되지 않았으면 `CredentialsMissing`(400)으로,
    /// 복호화 실패는 `Decryption`(500)으로 매핑됩니다.
    pub async fn kis_config_for(state: &AppState, user_id: Uuid) -> Result<KisConfig, ApiError> {
        let row = crate::repository::CredentialRepository::find_by_user(&state.pool, user_id)
            .await?
            .ok_or(ApiError::CredentialsMissing)?;

        let app_key = state
            .encryptor
            .decrypt(&row.app_key_enc)
            .map_err(|_| ApiError::Decryption)?;
        let app_secret = state
            .encryptor
            .decrypt(&row.app_secret_enc)
            .map_err(|_| ApiError::Decryption)?;
        let account_number = state
            .encryptor
            .decrypt(&row.account_number_enc)
            .map_err(|_| ApiError::Decryption)?;
        let product_code = state
            .encryptor
            .decrypt(&row.product_code_enc)
            .map_err(|_| ApiError::Decryption)?;

        debug!(
            "KIS config loaded: user={} account={}",
            user_id,
            mask_value(&account_number)
        );

        let mut config = KisConfig::new(app_key, app_secret, account_number, state.kis_environment)
            .with_token_dir(state.kis_token_dir.clone())
            .with_timeout_secs(state.upstream_timeout_secs);
        if !product_code.is_empty() {
            config = config.with_product_code(product_code);
        }

        Ok(config)
    }

    /// 사용자의 KIS 클라이언트 쌍 생성 (국내 + 해외, OAuth 공유).
    pub async fn clients_for(
        state: &AppState,
        user_id: Uuid,
    ) -> Result<(KisKrClient, KisUsClient), ApiError> {
        let config = Self::kis_config_for(state, user_id).await?;
        let oauth = state.oauth_for(user_id, config).await?;

        let kr = KisKrClient::new(Arc::clone(&oauth))?;
        let us = KisUsClient::new(oauth)?;
        Ok((kr, us))
    }

    /// 국내 잔고에서 계좌 요약 생성.
    pub async fn account_summary(
        state: &AppState,
        user_id: Uuid,
    ) -> Result<AccountSummary, ApiError> {
        let (kr, _us) = Self::clients_for(state, user_id).await?;
        let balance = kr.get_balance().await?;

        let stock_count = balance
            .holdings
            .iter()
            .filter(|h| h.quantity > Decimal::ZERO)
            .count();

        let summary = match balance.summary {
            Some(s) => s,
            None => {
                return Ok(AccountSummary {
                    total_asset: Decimal::ZERO,
                    deposit: Decimal::ZERO,
                    profit_loss: Decimal::ZERO,
                    profit_rate: None,
                    stock_count,
                })
            }
        };

        let profit_rate = if summary.total_purchase_amount > Decimal::ZERO {
            Some(
                (summary.total_profit_loss / summary.total_purchase_amount
                    * Decimal::ONE_HUNDRED)
                    .round_dp(2),
            )
        } else {
            None
        };

        Ok(AccountSummary {
            total_asset: summary.total_eval_amount,
            deposit: summary.deposit,
            profit_loss: summary.total_profit_loss,
            profit_rate,
            stock_count,
        })
    }
}
