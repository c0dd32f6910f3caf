use crate::domain::{BorrowBookError, ReturnBookError};
use crate::ports::StoreError;
use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
///
/// 貸出ルール違反（AlreadyBorrowed, BookUnavailable, NoActiveLoan）は
/// 想定内の業務上の結果であり、ストア障害とは区別される。
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 利用者がこの書籍を既に借りている
    #[error("User already has an active loan for this book")]
    AlreadyBorrowed,

    /// 書籍が貸出不可
    #[error("Book is not available for borrowing")]
    BookUnavailable,

    /// 返却対象の貸出がない
    #[error("User does not have an active loan for this book")]
    NoActiveLoan,

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// レコードストアのエラー（再試行可能なシステム障害）
    #[error("Record store error")]
    StoreError(#[source] StoreError),
}

impl LoanApplicationError {
    /// 呼び出し側が再試行してよいインフラ障害か
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoanApplicationError::StoreError(_))
    }
}

impl From<BorrowBookError> for LoanApplicationError {
    fn from(err: BorrowBookError) -> Self {
        match err {
            BorrowBookError::AlreadyBorrowed => LoanApplicationError::AlreadyBorrowed,
            BorrowBookError::BookUnavailable => LoanApplicationError::BookUnavailable,
        }
    }
}

impl From<ReturnBookError> for LoanApplicationError {
    fn from(err: ReturnBookError) -> Self {
        match err {
            ReturnBookError::NoActiveLoan => LoanApplicationError::NoActiveLoan,
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
