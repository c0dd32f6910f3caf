use crate::domain::{BookId, Loan, LoanId, UserId};
use crate::ports::loan_read_model::LoanReadModel as LoanReadModelTrait;
use crate::ports::loan_store::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{map_row_to_loan, map_sqlx_error};

/// LoanReadModelのPostgreSQL実装
///
/// 貸出履歴の参照専用。トランザクションは使わず、
/// コミット済みの状態のみを返す。
pub struct LoanReadModel {
    pool: PgPool,
}

impl LoanReadModel {
    /// PostgreSQLコネクションプールから新しいLoanReadModelを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanReadModelTrait for LoanReadModel {
    /// IDで貸出を取得
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                returned_at
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// 利用者の全貸出を検索（貸出履歴）
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                returned_at
            FROM loans
            WHERE user_id = $1
            ORDER BY borrowed_at DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(map_row_to_loan).collect()
    }

    /// 書籍の全貸出を検索（貸出履歴）
    ///
    /// (book_id, borrowed_at)のインデックスを使用。
    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                returned_at
            FROM loans
            WHERE book_id = $1
            ORDER BY borrowed_at DESC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(map_row_to_loan).collect()
    }
}
