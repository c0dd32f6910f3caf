use crate::domain::{Book, BookId, Loan, UserId};
use crate::ports::StoreError;
use crate::ports::loan_store::{
    LoanStore as LoanStoreTrait, LoanTransaction as LoanTransactionTrait, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::rows::{map_row_to_book, map_row_to_loan, map_sqlx_error};

/// PostgreSQL implementation of LoanStore
///
/// Each borrow/return runs in one database transaction at READ COMMITTED.
/// The book row is locked with `SELECT ... FOR UPDATE` before the open-loan
/// lookup, so every borrow/return on the same book is serialized across all
/// service instances sharing the database. The partial unique index
/// `loans_one_open_loan_per_book` backs the invariant in the schema.
pub struct LoanStore {
    pool: PgPool,
}

impl LoanStore {
    /// Create a new LoanStore with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// An open database transaction
///
/// Dropping it without `commit` rolls the transaction back.
pub struct LoanTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn begin(&self) -> Result<Box<dyn LoanTransactionTrait>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(LoanTransaction { tx }))
    }
}

#[async_trait]
impl LoanTransactionTrait for LoanTransaction {
    /// Lock the book row for the rest of the transaction
    async fn find_book_for_update(&mut self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT
                book_id,
                title,
                author,
                isbn,
                page_count,
                is_available,
                created_at,
                updated_at
            FROM books
            WHERE book_id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// Uses the (user_id, returned_at) index
    async fn find_open_loan(&mut self, user_id: UserId, book_id: BookId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                returned_at
            FROM loans
            WHERE user_id = $1 AND book_id = $2 AND returned_at IS NULL
            "#,
        )
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                returned_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.user_id.value())
        .bind(loan.book_id.value())
        .bind(loan.borrowed_at)
        .bind(loan.returned_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = $2
            WHERE loan_id = $1
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.returned_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Backend(
                format!("loan {} does not exist", loan.loan_id.value()).into(),
            ));
        }
        Ok(())
    }

    async fn update_book(&mut self, book: &Book) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET is_available = $2, updated_at = $3
            WHERE book_id = $1
            "#,
        )
        .bind(book.book_id.value())
        .bind(book.is_available())
        .bind(book.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Backend(
                format!("book {} does not exist", book.book_id.value()).into(),
            ));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
