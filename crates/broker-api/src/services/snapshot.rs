//! 자산 스냅샷 및 통계 서비스.
//!
//! 대시보드 요약 조회의 부수효과로 일별 스냅샷을 저장하고,
//! 저장된 시계열에서 일별/월별/연별 통계를 계산합니다.
//! 스냅샷 날짜는 한국 시간(Asia/Seoul) 기준입니다.

use crate::repository::{SnapshotRepository, SnapshotRow};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Asia::Seoul;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// 월별 통계.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStat {
    /// 월 ("YYYY-MM")
    pub month: String,
    pub start_asset: Decimal,
    pub end_asset: Decimal,
    pub profit_loss: Decimal,
    /// 수익률 (%), 시작 자산이 0 이하면 0
    pub profit_rate: Decimal,
    /// 일평균 총자산
    pub avg_daily_asset: Decimal,
}

/// 연별 통계.
#[derive(Debug, Clone, Serialize)]
pub struct YearlyStat {
    pub year: i32,
    pub start_asset: Decimal,
    pub end_asset: Decimal,
    pub profit_loss: Decimal,
    pub profit_rate: Decimal,
    /// 연중 최대 총자산
    pub max_asset: Decimal,
    /// 연중 최소 총자산
    pub min_asset: Decimal,
    /// 월평균 수익률 (%), 시작 자산이 양수인 달만 포함
    pub avg_monthly_return: Decimal,
}

/// 오늘 날짜 (한국 시간 기준).
pub fn today_kst() -> NaiveDate {
    Utc::now().with_timezone(&Seoul).date_naive()
}

/// 자산 스냅샷 서비스.
pub struct SnapshotService;

impl SnapshotService {
    /// 스냅샷 저장 (멱등).
    ///
    /// `stock_evaluation`과 `purchase_amount`는 입력에서 파생합니다.
    /// 같은 (사용자, 날짜)의 레코드가 이미 있으면 입력과 무관하게
    /// 기존 레코드가 반환됩니다.
    pub async fn save_snapshot(
        pool: &PgPool,
        user_id: Uuid,
        snapshot_date: NaiveDate,
        total_asset: Decimal,
        deposit: Decimal,
        profit_loss: Decimal,
        profit_rate: Decimal,
    ) -> Result<SnapshotRow, sqlx::Error> {
        let stock_evaluation = total_asset - deposit;
        let purchase_amount = stock_evaluation - profit_loss;

        SnapshotRepository::insert_if_absent(
            pool,
            user_id,
            snapshot_date,
            total_asset,
            deposit,
            stock_evaluation,
            purchase_amount,
            profit_loss,
            profit_rate,
        )
        .await
    }

    /// 스냅샷 저장을 백그라운드로 실행.
    ///
    /// 대시보드 조회 경로를 실패시키지 않기 위해 결과는 로그로만
    /// 남기고 버립니다.
    pub fn spawn_save(
        pool: PgPool,
        user_id: Uuid,
        total_asset: Decimal,
        deposit: Decimal,
        profit_loss: Decimal,
        profit_rate: Decimal,
    ) {
        tokio::spawn(async move {
            let date = today_kst();
            match Self::save_snapshot(
                &pool,
                user_id,
                date,
                total_asset,
                deposit,
                profit_loss,
                profit_rate,
            )
            .await
            {
                Ok(row) => debug!(
                    "snapshot saved: user={} date={} total={}",
                    user_id, row.snapshot_date, row.total_asset
                ),
                Err(e) => warn!("snapshot save failed for user {}: {}", user_id, e),
            }
        });
    }

    /// 일별 스냅샷 조회: [오늘 - days + 1, 오늘], 날짜 오름차순.
    ///
    /// 빠진 날짜는 채우지 않습니다.
    pub async fn daily_stats(
        pool: &PgPool,
        user_id: Uuid,
        days: i64,
    ) -> Result<Vec<SnapshotRow>, sqlx::Error> {
        let to = today_kst();
        let from = to - chrono::Duration::days(days - 1);
        SnapshotRepository::find_range(pool, user_id, from, to).await
    }

    /// 월별 통계 조회.
    pub async fn monthly_stats(
        pool: &PgPool,
        user_id: Uuid,
        months: i64,
    ) -> Result<Vec<MonthlyStat>, sqlx::Error> {
        let to = today_kst();
        let from = months_back(to, months - 1);
        let rows = SnapshotRepository::find_range(pool, user_id, from, to).await?;
        Ok(compute_monthly(&rows))
    }

    /// 연별 통계 조회.
    pub async fn yearly_stats(
        pool: &PgPool,
        user_id: Uuid,
        years: i64,
    ) -> Result<Vec<YearlyStat>, sqlx::Error> {
        let to = today_kst();
        let from = NaiveDate::from_ymd_opt(to.year() - (years as i32 - 1), 1, 1)
            .unwrap_or(to);
        let rows = SnapshotRepository::find_range(pool, user_id, from, to).await?;
        Ok(compute_yearly(&rows))
    }
}

/// `months`개월 전 달의 1일.
fn months_back(date: NaiveDate, months: i64) -> NaiveDate {
    let total = date.year() as i64 * 12 + date.month0() as i64 - months;
    let year = total.div_euclid(12) as i32;
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// 월별 통계 계산 (순수 함수).
///
/// 입력은 날짜 오름차순이어야 합니다.
pub fn compute_monthly(rows: &[SnapshotRow]) -> Vec<MonthlyStat> {
    let mut groups: BTreeMap<String, Vec<&SnapshotRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.snapshot_date.format("%Y-%m").to_string())
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|(month, rows)| {
            let start = rows.first().map(|r| r.total_asset).unwrap_or_default();
            let end = rows.last().map(|r| r.total_asset).unwrap_or_default();
            let profit_loss = end - start;
            let profit_rate = if start > Decimal::ZERO {
                profit_loss / start * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            let sum: Decimal = rows.iter().map(|r| r.total_asset).sum();
            let avg_daily_asset = sum / Decimal::from(rows.len());

            MonthlyStat {
                month,
                start_asset: start,
                end_asset: end,
                profit_loss,
                profit_rate,
                avg_daily_asset,
            }
        })
        .collect()
}

/// 연별 통계 계산 (순수 함수).
pub fn compute_yearly(rows: &[SnapshotRow]) -> Vec<YearlyStat> {
    let monthly = compute_monthly(rows);

    let mut groups: BTreeMap<i32, Vec<&SnapshotRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.snapshot_date.year()).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(year, rows)| {
            let start = rows.first().map(|r| r.total_asset).unwrap_or_default();
            let end = rows.last().map(|r| r.total_asset).unwrap_or_default();
            let profit_loss = end - start;
            let profit_rate = if start > Decimal::ZERO {
                profit_loss / start * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            let max_asset = rows.iter().map(|r| r.total_asset).max().unwrap_or_default();
            let min_asset = rows.iter().map(|r| r.total_asset).min().unwrap_or_default();

            // 시작 자산이 양수인 달의 수익률 평균
            let year_prefix = format!("{:04}-", year);
            let month_returns: Vec<Decimal> = monthly
                .iter()
                .filter(|m| m.month.starts_with(&year_prefix) && m.start_asset > Decimal::ZERO)
                .map(|m| m.profit_rate)
                .collect();
            let avg_monthly_return = if month_returns.is_empty() {
                Decimal::ZERO
            } else {
                month_returns.iter().copied().sum::<Decimal>()
                    / Decimal::from(month_returns.len())
            };

            YearlyStat {
                year,
                start_asset: start,
                end_asset: end,
                profit_loss,
                profit_rate,
                max_asset,
                min_asset,
                avg_monthly_return,
            }
        })
        .collect()
}
