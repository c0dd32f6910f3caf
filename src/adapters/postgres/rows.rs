use crate::domain::{Book, BookId, Isbn, Loan, LoanId, PageCount, UserId};
use crate::ports::StoreError;
use crate::ports::loan_store::Result;
use sqlx::{Row, postgres::PgRow};

/// sqlxのエラーをストアのエラーに分類する
///
/// - 一意制約違反（23505）: UniqueViolation（制約名つき）
/// - シリアライズ失敗（40001）・デッドロック（40P01）: Conflict
/// - その他: Backend
pub(super) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or_default().to_string(),
            };
        }
        if let Some(code) = db_err.code() {
            if matches!(&*code, "40001" | "40P01") {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
    }
    StoreError::Backend(Box::new(err))
}

pub(super) fn invalid_data(message: String) -> StoreError {
    StoreError::Backend(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

/// PostgreSQLの行データをBookに変換する
///
/// ISBNとページ数は値オブジェクトとして再検証する。
pub(super) fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let isbn_str: String = row.try_get("isbn").map_err(map_sqlx_error)?;
    let isbn = Isbn::parse(&isbn_str)
        .map_err(|e| invalid_data(format!("invalid isbn {}: {}", isbn_str, e)))?;

    let page_count_i32: i32 = row.try_get("page_count").map_err(map_sqlx_error)?;
    let page_count = PageCount::try_from(page_count_i32)
        .map_err(|_| invalid_data(format!("page_count out of range: {}", page_count_i32)))?;

    Ok(Book::restore(
        BookId::from_uuid(row.try_get("book_id").map_err(map_sqlx_error)?),
        row.try_get("title").map_err(map_sqlx_error)?,
        row.try_get("author").map_err(map_sqlx_error)?,
        isbn,
        page_count,
        row.try_get("is_available").map_err(map_sqlx_error)?,
        row.try_get("created_at").map_err(map_sqlx_error)?,
        row.try_get("updated_at").map_err(map_sqlx_error)?,
    ))
}

/// PostgreSQLの行データをLoanに変換する
pub(super) fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    Ok(Loan {
        loan_id: LoanId::from_uuid(row.try_get("loan_id").map_err(map_sqlx_error)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(map_sqlx_error)?),
        book_id: BookId::from_uuid(row.try_get("book_id").map_err(map_sqlx_error)?),
        borrowed_at: row.try_get("borrowed_at").map_err(map_sqlx_error)?,
        returned_at: row.try_get("returned_at").map_err(map_sqlx_error)?,
    })
}

/// ページ数をINTEGER列の値に変換する
pub(super) fn page_count_column(page_count: PageCount) -> Result<i32> {
    i32::try_from(page_count.value())
        .map_err(|_| invalid_data(format!("page_count out of range: {}", page_count.value())))
}
