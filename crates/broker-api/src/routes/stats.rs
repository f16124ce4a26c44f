//! 자산 통계 라우트.
//!
//! 저장된 일별 스냅샷에서 일별/월별/연별 통계를 조회합니다.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::snapshot::{MonthlyStat, SnapshotService, YearlyStat};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// 일별 통계 쿼리.
#[derive(Debug, Deserialize, Validate)]
pub struct DailyQuery {
    /// 조회 일수 (1-365, 기본 30)
    #[serde(default = "default_days")]
    #[validate(range(min = 1, max = 365, message = "days는 1-365 범위여야 합니다"))]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

/// 월별 통계 쿼리.
#[derive(Debug, Deserialize, Validate)]
pub struct MonthlyQuery {
    /// 조회 개월 수 (1-60, 기본 12)
    #[serde(default = "default_months")]
    #[validate(range(min = 1, max = 60, message = "months는 1-60 범위여야 합니다"))]
    pub months: i64,
}

fn default_months() -> i64 {
    12
}

/// 연별 통계 쿼리.
#[derive(Debug, Deserialize, Validate)]
pub struct YearlyQuery {
    /// 조회 연수 (1-10, 기본 5)
    #[serde(default = "default_years")]
    #[validate(range(min = 1, max = 10, message = "years는 1-10 범위여야 합니다"))]
    pub years: i64,
}

fn default_years() -> i64 {
    5
}

/// 일별 스냅샷 항목.
#[derive(Debug, Serialize)]
pub struct DailyStat {
    /// 날짜 ("YYYY-MM-DD")
    pub date: String,
    pub total_asset: Decimal,
    pub deposit: Decimal,
    pub stock_evaluation: Decimal,
    pub purchase_amount: Decimal,
    pub profit_loss: Decimal,
    pub profit_rate: Decimal,
}

fn validation_error(e: validator::ValidationErrors) -> ApiError {
    let message = e
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .filter_map(|err| err.message.as_ref())
        .map(|m| m.to_string())
        .next()
        .unwrap_or_else(|| "쿼리 파라미터가 유효하지 않습니다".to_string());
    ApiError::Validation(message)
}

/// 일별 통계 조회.
///
/// GET /api/v1/stats/daily?days=
pub async fn daily(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<DailyQuery>,
) -> Result<Json<Vec<DailyStat>>, ApiError> {
    query.validate().map_err(validation_error)?;

    let rows = SnapshotService::daily_stats(&state.pool, user.user_id, query.days).await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| DailyStat {
                date: r.snapshot_date.to_string(),
                total_asset: r.total_asset,
                deposit: r.deposit,
                stock_evaluation: r.stock_evaluation,
                purchase_amount: r.purchase_amount,
                profit_loss: r.profit_loss,
                profit_rate: r.profit_rate,
            })
            .collect(),
    ))
}

/// 월별 통계 조회.
///
/// GET /api/v1/stats/monthly?months=
pub async fn monthly(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyStat>>, ApiError> {
    query.validate().map_err(validation_error)?;

    let stats = SnapshotService::monthly_stats(&state.pool, user.user_id, query.months).await?;
    Ok(Json(stats))
}

/// 연별 통계 조회.
///
/// GET /api/v1/stats/yearly?years=
pub async fn yearly(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<YearlyQuery>,
) -> Result<Json<Vec<YearlyStat>>, ApiError> {
    query.validate().map_err(validation_error)?;

    let stats = SnapshotService::yearly_stats(&state.pool, user.user_id, query.years).await?;
    Ok(Json(stats))
}

/// 통계 라우터 생성.
pub fn stats_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/daily", get(daily))
        .route("/monthly", get(monthly))
        .route("/yearly", get(yearly))
}
