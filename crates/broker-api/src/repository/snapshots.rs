//! 자산 스냅샷 Repository.
//!
//! `asset_snapshots`는 (user_id, snapshot_date) 기준 append-only
//! 테이블입니다. 같은 날짜에 대한 재저장은 기존 레코드를 그대로
//! 유지합니다.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// 일별 자산 스냅샷 레코드.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub snapshot_date: NaiveDate,
    /// 총 자산
    pub total_asset: Decimal,
    /// 예수금
    pub deposit: Decimal,
    /// 주식 평가금액 (총자산 - 예수금)
    pub stock_evaluation: Decimal,
    /// 매입금액 (평가금액 - 평가손익)
    pub purchase_amount: Decimal,
    /// 평가손익
    pub profit_loss: Decimal,
    /// 수익률 (%)
    pub profit_rate: Decimal,
    pub created_at: DateTime<Utc>,
}

/// 자산 스냅샷 Repository.
pub struct SnapshotRepository;

impl SnapshotRepository {
    /// 스냅샷 저장 (멱등).
    ///
    /// (user_id, snapshot_date)가 이미 존재하면 입력값과 무관하게
    /// 기존 레코드를 반환합니다.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_if_absent(
        pool: &PgPool,
        user_id: Uuid,
        snapshot_date: NaiveDate,
        total_asset: Decimal,
        deposit: Decimal,
        stock_evaluation: Decimal,
        purchase_amount: Decimal,
        profit_loss: Decimal,
        profit_rate: Decimal,
    ) -> Result<SnapshotRow, sqlx::Error> {
        let inserted = sqlx::query_as::<_, SnapshotRow>(
            r#"
            INSERT INTO asset_snapshots
                (user_id, snapshot_date, total_asset, deposit, stock_evaluation,
                 purchase_amount, profit_loss, profit_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, snapshot_date) DO NOTHING
            RETURNING id, user_id, snapshot_date, total_asset, deposit,
                      stock_evaluation, purchase_amount, profit_loss, profit_rate,
                      created_at
            "#,
        )
        .bind(user_id)
        .bind(snapshot_date)
        .bind(total_asset)
        .bind(deposit)
        .bind(stock_evaluation)
        .bind(purchase_amount)
        .bind(profit_loss)
        .bind(profit_rate)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row);
        }

        // 충돌 시 기존 레코드 반환
        sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, user_id, snapshot_date, total_asset, deposit,
                   stock_evaluation, purchase_amount, profit_loss, profit_rate,
                   created_at
            FROM asset_snapshots
            WHERE user_id = $1 AND snapshot_date = $2
            "#,
        )
        .bind(user_id)
        .bind(snapshot_date)
        .fetch_one(pool)
        .await
    }

    /// 날짜 구간의 스냅샷 조회 (날짜 오름차순).
    pub async fn find_range(
        pool: &PgPool,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SnapshotRow>, sqlx::Error> {
        sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, user_id, snapshot_date, total_asset, deposit,
                   stock_evaluation, purchase_amount, profit_loss, profit_rate,
                   created_at
            FROM asset_snapshots
            WHERE user_id = $1 AND snapshot_date BETWEEN $2 AND $3
            ORDER BY snapshot_date ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
