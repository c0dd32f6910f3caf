use thiserror::Error;

/// 貸出のエラー
///
/// 判定順序は AlreadyBorrowed → BookUnavailable。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowBookError {
    /// 同じ利用者がこの書籍を既に借りている
    AlreadyBorrowed,
    /// 書籍が貸出不可（他の利用者に貸出中、または状態不整合）
    BookUnavailable,
}

/// 返却のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnBookError {
    /// この利用者・書籍の組に貸出中のレコードがない
    ///
    /// 未貸出・返却済み・他の利用者が貸出中を区別しない。
    NoActiveLoan,
}

/// 書籍登録時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookValidationError {
    #[error("Title must not be blank")]
    BlankTitle,

    #[error("Author must not be blank")]
    BlankAuthor,

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("ISBN must be 10 or 13 digits long (got {0})")]
    InvalidIsbnLength(usize),

    #[error("ISBN must contain only digits (or a trailing X for ISBN-10)")]
    InvalidIsbnCharacters,

    #[error("Page count must be greater than 0")]
    NonPositivePageCount,

    #[error("Page count must be at most {max}")]
    PageCountTooLarge { max: u32 },
}
