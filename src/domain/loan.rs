use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Book, BookId, BorrowBookError, LoanId, ReturnBookError, UserId};

/// Loan - 1人の利用者による1冊の1回の貸出
///
/// `returned_at` が `None` の間は貸出中（open）、設定後は返却済み（closed）。
/// 返却済みから貸出中へ戻ることはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    // 識別子
    pub loan_id: LoanId,

    // 他のレコードへの参照（IDのみ）
    pub user_id: UserId,
    pub book_id: BookId,

    // 貸出管理の責務
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// 貸出中かどうか
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }

    /// 返却日時を設定する（一度だけ）
    ///
    /// 呼び出し側が貸出中であることを確認済みであること。
    fn mark_returned(self, now: DateTime<Utc>) -> Self {
        debug_assert!(self.is_active(), "loan {:?} is already closed", self.loan_id);
        Self {
            returned_at: Some(now),
            ..self
        }
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 同じ利用者が同じ書籍を貸出中なら AlreadyBorrowed
/// - 書籍が貸出不可なら BookUnavailable
/// - 上記の順序で判定する
///
/// `open_loan` はトランザクション内で取得した (user, book) の貸出中レコード。
/// 副作用なし。新しいLoanと更新後のBookを返す。
pub fn borrow_book(
    user_id: UserId,
    book: &Book,
    open_loan: Option<&Loan>,
    borrowed_at: DateTime<Utc>,
) -> Result<(Loan, Book), BorrowBookError> {
    // バリデーション：二重貸出の禁止
    if open_loan.is_some_and(|loan| {
        loan.is_active() && loan.user_id == user_id && loan.book_id == book.book_id
    }) {
        return Err(BorrowBookError::AlreadyBorrowed);
    }

    // バリデーション：貸出可否
    if !book.is_available() {
        return Err(BorrowBookError::BookUnavailable);
    }

    let loan = Loan {
        loan_id: LoanId::new(),
        user_id,
        book_id: book.book_id,
        borrowed_at,
        returned_at: None,
    };

    let mut book = book.clone();
    book.set_availability(false, borrowed_at);

    Ok((loan, book))
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - (user, book) の貸出中レコードがなければ NoActiveLoan
/// - 返却後、書籍は貸出可能に戻る
///
/// 副作用なし。返却済みのLoanと更新後のBookを返す。
pub fn return_book(
    user_id: UserId,
    book: &Book,
    open_loan: Option<Loan>,
    returned_at: DateTime<Utc>,
) -> Result<(Loan, Book), ReturnBookError> {
    let loan = open_loan
        .filter(|loan| loan.is_active() && loan.user_id == user_id && loan.book_id == book.book_id)
        .ok_or(ReturnBookError::NoActiveLoan)?;

    let loan = loan.mark_returned(returned_at);

    let mut book = book.clone();
    book.set_availability(true, returned_at);

    Ok((loan, book))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Isbn, PageCount};
    use chrono::Duration;

    fn available_book() -> Book {
        Book::register(
            "Test Book",
            "Test Author",
            Isbn::parse("1234567890").unwrap(),
            PageCount::try_from(100u32).unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    // TDD: borrow_book() のテスト
    #[test]
    fn test_borrow_book_creates_open_loan_and_marks_book_unavailable() {
        let user_id = UserId::new();
        let book = available_book();
        let borrowed_at = Utc::now();

        let (loan, updated_book) = borrow_book(user_id, &book, None, borrowed_at).unwrap();

        assert_eq!(loan.user_id, user_id);
        assert_eq!(loan.book_id, book.book_id);
        assert_eq!(loan.borrowed_at, borrowed_at);
        assert!(loan.returned_at.is_none());
        assert!(loan.is_active());

        assert!(!updated_book.is_available());
        assert_eq!(updated_book.updated_at, borrowed_at);
        // 入力の書籍は変更されない
        assert!(book.is_available());
    }

    #[test]
    fn test_borrow_book_fails_when_user_already_holds_loan() {
        let user_id = UserId::new();
        let book = available_book();
        let (loan, book) = borrow_book(user_id, &book, None, Utc::now()).unwrap();

        let result = borrow_book(user_id, &book, Some(&loan), Utc::now());
        assert_eq!(result.unwrap_err(), BorrowBookError::AlreadyBorrowed);
    }

    #[test]
    fn test_borrow_book_checks_already_borrowed_before_availability() {
        // 書籍が貸出可能フラグのままでも、貸出中レコードがあれば AlreadyBorrowed
        let user_id = UserId::new();
        let book = available_book();
        let (loan, _) = borrow_book(user_id, &book, None, Utc::now()).unwrap();

        let result = borrow_book(user_id, &book, Some(&loan), Utc::now());
        assert_eq!(result.unwrap_err(), BorrowBookError::AlreadyBorrowed);
    }

    #[test]
    fn test_borrow_book_fails_when_book_unavailable() {
        let book = available_book();
        let (_, book) = borrow_book(UserId::new(), &book, None, Utc::now()).unwrap();

        let result = borrow_book(UserId::new(), &book, None, Utc::now());
        assert_eq!(result.unwrap_err(), BorrowBookError::BookUnavailable);
    }

    #[test]
    fn test_borrow_book_ignores_closed_loan() {
        let user_id = UserId::new();
        let book = available_book();
        let (loan, book) = borrow_book(user_id, &book, None, Utc::now()).unwrap();
        let (closed, book) = return_book(user_id, &book, Some(loan), Utc::now()).unwrap();

        let result = borrow_book(user_id, &book, Some(&closed), Utc::now());
        assert!(result.is_ok());
    }

    // TDD: return_book() のテスト
    #[test]
    fn test_return_book_closes_loan_and_marks_book_available() {
        let user_id = UserId::new();
        let book = available_book();
        let borrowed_at = Utc::now();
        let (loan, book) = borrow_book(user_id, &book, None, borrowed_at).unwrap();
        let returned_at = borrowed_at + Duration::days(7);

        let (returned, book) = return_book(user_id, &book, Some(loan.clone()), returned_at).unwrap();

        assert_eq!(returned.loan_id, loan.loan_id);
        assert_eq!(returned.borrowed_at, borrowed_at);
        assert_eq!(returned.returned_at, Some(returned_at));
        assert!(!returned.is_active());
        assert!(book.is_available());
    }

    #[test]
    fn test_return_book_fails_without_open_loan() {
        let book = available_book();
        let result = return_book(UserId::new(), &book, None, Utc::now());
        assert_eq!(result.unwrap_err(), ReturnBookError::NoActiveLoan);
    }

    #[test]
    fn test_return_book_fails_for_closed_loan() {
        let user_id = UserId::new();
        let book = available_book();
        let (loan, book) = borrow_book(user_id, &book, None, Utc::now()).unwrap();
        let (closed, book) = return_book(user_id, &book, Some(loan), Utc::now()).unwrap();

        let result = return_book(user_id, &book, Some(closed), Utc::now());
        assert_eq!(result.unwrap_err(), ReturnBookError::NoActiveLoan);
    }

    #[test]
    fn test_return_book_fails_for_another_users_loan() {
        let owner = UserId::new();
        let book = available_book();
        let (loan, book) = borrow_book(owner, &book, None, Utc::now()).unwrap();

        let result = return_book(UserId::new(), &book, Some(loan), Utc::now());
        assert_eq!(result.unwrap_err(), ReturnBookError::NoActiveLoan);
    }
}
