//! KIS 자격증명 Repository.
//!
//! app_key, app_secret, 계좌번호, 계좌상품코드 네 필드는 모두 개별
//! 암호화된 문자열로 저장됩니다. 평문은 DB에 절대 저장되지 않습니다.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// 암호화된 자격증명 레코드.
///
/// 모든 `*_enc` 필드는 nonce가 앞에 붙은 base64 암호문입니다.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRow {
    pub user_id: Uuid,
    pub app_key_enc: String,
    pub app_secret_enc: String,
    pub account_number_enc: String,
    pub product_code_enc: String,
    pub registered_at: DateTime<Utc>,
}

/// KIS 자격증명 Repository.
pub struct CredentialRepository;

impl CredentialRepository {
    /// 자격증명 등록 또는 갱신.
    ///
    /// 사용자당 하나의 자격증명 세트만 유지합니다 (재등록 시 교체).
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        app_key_enc: &str,
        app_secret_enc: &str,
        account_number_enc: &str,
        product_code_enc: &str,
    ) -> Result<CredentialRow, sqlx::Error> {
        sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO user_credentials
                (user_id, app_key_enc, app_secret_enc, account_number_enc, product_code_enc)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                app_key_enc = EXCLUDED.app_key_enc,
                app_secret_enc = EXCLUDED.app_secret_enc,
                account_number_enc = EXCLUDED.account_number_enc,
                product_code_enc = EXCLUDED.product_code_enc,
                registered_at = now()
            RETURNING user_id, app_key_enc, app_secret_enc,
                      account_number_enc, product_code_enc, registered_at
            "#,
        )
        .bind(user_id)
        .bind(app_key_enc)
        .bind(app_secret_enc)
        .bind(account_number_enc)
        .bind(product_code_enc)
        .fetch_one(pool)
        .await
    }

    /// 사용자의 자격증명 조회.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<CredentialRow>, sqlx::Error> {
        sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT user_id, app_key_enc, app_secret_enc,
                   account_number_enc, product_code_enc, registered_at
            FROM user_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
