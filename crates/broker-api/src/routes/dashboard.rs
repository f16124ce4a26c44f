//! 대시보드 라우트.
//!
//! 계좌 요약과 시장별 보유 종목 조회를 제공합니다. 요약 조회는
//! 부수효과로 오늘 자 자산 스냅샷을 백그라운드에서 저장합니다.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::account::{AccountService, AccountSummary};
use crate::services::normalizer::{self, HoldingItem, HoldingsSummary, Market};
use crate::services::snapshot::SnapshotService;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use broker_exchange::{KisKrClient, KisUsClient};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// 잔고 조회 대상 해외 거래소 코드 (KIS 잔고 API 기준).
const US_BALANCE_EXCHANGES: [&str; 3] = ["NASD", "NYSE", "AMEX"];

/// 보유 종목 조회 쿼리.
#[derive(Debug, Deserialize)]
pub struct HoldingsQuery {
    /// 시장 필터 (ALL | DOMESTIC | OVERSEAS, 기본 ALL)
    pub market: Option<String>,
}

/// 보유 종목 응답.
#[derive(Debug, Serialize)]
pub struct HoldingsResponse {
    pub market: Market,
    pub items: Vec<HoldingItem>,
    pub summary: HoldingsSummary,
}

/// 계좌 요약 조회.
///
/// GET /api/v1/dashboard/summary
///
/// 조회 결과는 백그라운드 스냅샷 저장으로 이어지며, 저장 실패는
/// 응답에 영향을 주지 않습니다.
pub async fn summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<AccountSummary>, ApiError> {
    let summary = AccountService::account_summary(&state, user.user_id).await?;

    SnapshotService::spawn_save(
        state.pool.clone(),
        user.user_id,
        summary.total_asset,
        summary.deposit,
        summary.profit_loss,
        summary.profit_rate.unwrap_or(Decimal::ZERO),
    );

    Ok(Json(summary))
}

/// 보유 종목 조회.
///
/// GET /api/v1/dashboard/holdings?market=
///
/// ALL 조회는 국내/해외 중 한쪽이 실패해도 나머지 쪽의 결과를
/// 반환합니다 (실패한 쪽은 빈 목록). 양쪽 다 실패하면 에러입니다.
pub async fn holdings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<HoldingsQuery>,
) -> Result<Json<HoldingsResponse>, ApiError> {
    let market = match query.market.as_deref() {
        Some(value) => Market::parse(value).ok_or_else(|| {
            ApiError::Validation(format!("market 값이 유효하지 않습니다: {}", value))
        })?,
        None => Market::All,
    };

    let (kr, us) = AccountService::clients_for(&state, user.user_id).await?;

    let items = match market {
        Market::Domestic => fetch_domestic(&kr).await?,
        Market::Overseas => fetch_overseas(&us).await?,
        Market::All => {
            let domestic = fetch_domestic(&kr).await;
            let overseas = fetch_overseas(&us).await;

            match (domestic, overseas) {
                (Err(d), Err(o)) => {
                    warn!("both markets failed: domestic={}, overseas={}", d, o);
                    return Err(d);
                }
                (d, o) => {
                    let mut items = d.unwrap_or_else(|e| {
                        warn!("domestic holdings failed, continuing: {}", e);
                        Vec::new()
                    });
                    items.extend(o.unwrap_or_else(|e| {
                        warn!("overseas holdings failed, continuing: {}", e);
                        Vec::new()
                    }));
                    items
                }
            }
        }
    };

    let summary = normalizer::summarize(&items, market);

    Ok(Json(HoldingsResponse {
        market,
        items,
        summary,
    }))
}

async fn fetch_domestic(kr: &KisKrClient) -> Result<Vec<HoldingItem>, ApiError> {
    let balance = kr.get_balance().await?;
    Ok(normalizer::parse_domestic(&balance.holdings))
}

/// 해외 보유 종목 조회.
///
/// 거래소별로 잔고를 조회해 병합합니다. 일부 거래소 실패는 허용하되
/// 전부 실패하면 마지막 에러를 반환합니다.
async fn fetch_overseas(us: &KisUsClient) -> Result<Vec<HoldingItem>, ApiError> {
    let mut items = Vec::new();
    let mut last_err: Option<ApiError> = None;
    let mut any_ok = false;

    for exchange in US_BALANCE_EXCHANGES {
        match us.get_balance(exchange).await {
            Ok(balance) => {
                any_ok = true;
                items.extend(normalizer::parse_overseas(&balance.holdings));
            }
            Err(e) => {
                warn!("overseas balance failed for {}: {}", exchange, e);
                last_err = Some(e.into());
            }
        }
    }

    if !any_ok {
        if let Some(err) = last_err {
            return Err(err);
        }
    }

    Ok(items)
}

/// 대시보드 라우터 생성.
pub fn dashboard_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/summary", get(summary))
        .route("/holdings", get(holdings))
}
