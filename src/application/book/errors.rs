use crate::domain::BookValidationError;
use crate::ports::StoreError;
use thiserror::Error;

/// 書籍管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookApplicationError {
    /// 入力値が不正（ISBN形式、ページ数など）
    #[error("Invalid book: {0}")]
    InvalidBook(#[source] BookValidationError),

    /// 同じISBNの書籍が既に登録されている
    #[error("A book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出中の書籍は削除できない
    #[error("Book is currently on loan")]
    BookOnLoan,

    /// レコードストアのエラー
    #[error("Record store error")]
    StoreError(#[source] StoreError),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookApplicationError>;
