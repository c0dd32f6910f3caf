use crate::domain::{Book, BookId};
use crate::ports::book_repository::{BookDeletion, BookRepository as BookRepositoryTrait};
use crate::ports::loan_store::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{map_row_to_book, map_sqlx_error, page_count_column};

/// BookRepositoryのPostgreSQL実装
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// PostgreSQLコネクションプールから新しいBookRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    /// 書籍を登録
    ///
    /// ISBNの重複は `books_isbn_key` 制約違反として返る。
    async fn insert(&self, book: &Book) -> Result<()> {
        let page_count = page_count_column(book.page_count)?;

        sqlx::query(
            r#"
            INSERT INTO books (
                book_id,
                title,
                author,
                isbn,
                page_count,
                is_available,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.as_str())
        .bind(page_count)
        .bind(book.is_available())
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    /// IDで書籍を取得
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
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
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 書誌情報を更新
    ///
    /// `is_available` は貸出トランザクションだけが書き換えるため対象外。
    async fn update_details(&self, book: &Book) -> Result<bool> {
        let page_count = page_count_column(book.page_count)?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2,
                author = $3,
                isbn = $4,
                page_count = $5,
                updated_at = $6
            WHERE book_id = $1
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.as_str())
        .bind(page_count)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    /// 貸出中でなければ書籍を削除
    ///
    /// 判定と削除を1文で行うため、同時に走る貸出（`FOR UPDATE`）と競合しない。
    /// 返却済みの貸出履歴は外部キーのカスケードで削除される。
    async fn delete_if_available(&self, book_id: BookId) -> Result<BookDeletion> {
        let (deleted, exists): (bool, bool) = sqlx::query_as(
            r#"
            WITH deleted AS (
                DELETE FROM books
                WHERE book_id = $1 AND is_available
                RETURNING book_id
            )
            SELECT
                EXISTS (SELECT 1 FROM deleted),
                EXISTS (SELECT 1 FROM books WHERE book_id = $1)
            "#,
        )
        .bind(book_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(match (deleted, exists) {
            (true, _) => BookDeletion::Deleted,
            (false, true) => BookDeletion::OnLoan,
            (false, false) => BookDeletion::NotFound,
        })
    }
}
