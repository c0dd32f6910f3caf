use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Book, BookId, Loan, UserId,
    commands::{BorrowBook, RegisterBook, ReturnBook, UpdateBook},
};

// ============================================================================
// Request types
// ============================================================================

/// 書籍登録リクエスト（POST /books）
#[derive(Debug, Deserialize)]
pub struct RegisterBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: u32,
}

impl RegisterBookRequest {
    pub fn to_command(&self) -> RegisterBook {
        RegisterBook {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            page_count: self.page_count,
            registered_at: Utc::now(),
        }
    }
}

/// 書籍更新リクエスト（PUT /books/:id）
///
/// 書誌情報をすべて置き換える。貸出可否は含まない。
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: u32,
}

impl UpdateBookRequest {
    pub fn to_command(&self, book_id: Uuid) -> UpdateBook {
        UpdateBook {
            book_id: BookId::from_uuid(book_id),
            title: Some(self.title.clone()),
            author: Some(self.author.clone()),
            isbn: Some(self.isbn.clone()),
            page_count: Some(self.page_count),
            updated_at: Utc::now(),
        }
    }
}

/// 書籍の部分更新リクエスト（PATCH /books/:id）
#[derive(Debug, Default, Deserialize)]
pub struct PatchBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub page_count: Option<u32>,
}

impl PatchBookRequest {
    pub fn to_command(&self, book_id: Uuid) -> UpdateBook {
        UpdateBook {
            book_id: BookId::from_uuid(book_id),
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            page_count: self.page_count,
            updated_at: Utc::now(),
        }
    }
}

/// 貸出・返却リクエスト（POST /books/:id/borrow, POST /books/:id/return）
///
/// 認証は対象外のため、利用者IDはリクエストボディで受け取る。
#[derive(Debug, Deserialize)]
pub struct LoanRequest {
    pub user_id: Uuid,
}

impl LoanRequest {
    pub fn to_borrow_command(&self, book_id: Uuid) -> BorrowBook {
        BorrowBook {
            user_id: UserId::from_uuid(self.user_id),
            book_id: BookId::from_uuid(book_id),
            borrowed_at: Utc::now(),
        }
    }

    pub fn to_return_command(&self, book_id: Uuid) -> ReturnBook {
        ReturnBook {
            user_id: UserId::from_uuid(self.user_id),
            book_id: BookId::from_uuid(book_id),
            returned_at: Utc::now(),
        }
    }
}

/// 貸出一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// 利用者IDでフィルタリング（必須）
    pub user_id: Option<Uuid>,
    /// 貸出中のみ（true）／返却済みのみ（false）
    pub active: Option<bool>,
}

// ============================================================================
// Response types
// ============================================================================

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id.value(),
            is_available: book.is_available(),
            isbn: book.isbn.to_string(),
            page_count: book.page_count.value(),
            title: book.title,
            author: book.author,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.loan_id.value(),
            user_id: loan.user_id.value(),
            book_id: loan.book_id.value(),
            borrowed_at: loan.borrowed_at,
            returned_at: loan.returned_at,
            is_active: loan.is_active(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
