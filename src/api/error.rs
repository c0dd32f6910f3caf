use crate::application::book::BookApplicationError;
use crate::application::loan::LoanApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Loan(LoanApplicationError),
    Book(BookApplicationError),
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Loan(err)
    }
}

impl From<BookApplicationError> for ApiError {
    fn from(err: BookApplicationError) -> Self {
        ApiError::Book(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            // 409 Conflict - 書籍の現在の状態と衝突する
            ApiError::Loan(LoanApplicationError::AlreadyBorrowed) => (
                StatusCode::CONFLICT,
                "ALREADY_BORROWED",
                "User already has an active loan for this book".to_string(),
            ),
            ApiError::Loan(LoanApplicationError::BookUnavailable) => (
                StatusCode::CONFLICT,
                "BOOK_UNAVAILABLE",
                "Book is not available for borrowing".to_string(),
            ),
            ApiError::Book(BookApplicationError::DuplicateIsbn(isbn)) => (
                StatusCode::CONFLICT,
                "DUPLICATE_ISBN",
                format!("A book with ISBN {} already exists", isbn),
            ),
            ApiError::Book(BookApplicationError::BookOnLoan) => (
                StatusCode::CONFLICT,
                "BOOK_ON_LOAN",
                "Book is currently on loan and cannot be deleted".to_string(),
            ),

            // 422 Unprocessable Entity - ビジネスルール違反
            ApiError::Loan(LoanApplicationError::NoActiveLoan) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_ACTIVE_LOAN",
                "User does not have an active loan for this book".to_string(),
            ),
            ApiError::Book(BookApplicationError::InvalidBook(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_BOOK",
                e.to_string(),
            ),

            // 404 Not Found - リクエストされたリソースが存在しない
            ApiError::Loan(LoanApplicationError::BookNotFound)
            | ApiError::Book(BookApplicationError::BookNotFound) => (
                StatusCode::NOT_FOUND,
                "BOOK_NOT_FOUND",
                "Book not found".to_string(),
            ),

            // 503 Service Unavailable - ストア障害（再試行可能）
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Loan(LoanApplicationError::StoreError(e))
            | ApiError::Book(BookApplicationError::StoreError(e)) => {
                tracing::error!(error = ?e, "Record store error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "The record store is temporarily unavailable, please retry".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookValidationError;
    use crate::ports::StoreError;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_loan_rule_violations_map_to_conflict_or_unprocessable() {
        assert_eq!(
            status_of(LoanApplicationError::AlreadyBorrowed),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LoanApplicationError::BookUnavailable),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LoanApplicationError::NoActiveLoan),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_not_found_errors_map_to_404() {
        assert_eq!(
            status_of(LoanApplicationError::BookNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(BookApplicationError::BookNotFound),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_registration_errors() {
        assert_eq!(
            status_of(BookApplicationError::InvalidBook(
                BookValidationError::NonPositivePageCount
            )),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(BookApplicationError::DuplicateIsbn("1234567890".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_deleting_book_on_loan_is_conflict() {
        let response = ApiError::from(BookApplicationError::BookOnLoan).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_store_errors_map_to_service_unavailable() {
        assert_eq!(
            status_of(LoanApplicationError::StoreError(StoreError::Conflict(
                "serialization failure".to_string()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(BookApplicationError::StoreError(StoreError::Backend(
                "connection refused".into()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
