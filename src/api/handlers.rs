use crate::application::{
    ServiceDependencies,
    book::{
        delete_book as execute_delete_book, get_book as execute_get_book,
        register_book as execute_register_book, update_book as execute_update_book,
    },
    loan::{
        LoanApplicationError, borrow_book as execute_borrow_book,
        return_book as execute_return_book,
    },
};
use crate::domain::{BookId, LoanId, UserId};
use crate::ports::StoreError;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        BookResponse, ErrorResponse, ListLoansQuery, LoanRequest, LoanResponse,
        PatchBookRequest, RegisterBookRequest, UpdateBookRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Command handlers (POST / PUT / PATCH / DELETE)
// ============================================================================

/// POST /books - 書籍を登録
///
/// 登録直後の書籍は貸出可能。
pub async fn register_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = execute_register_book(&state.service_deps, req.to_command()).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// PUT /books/:id - 書籍の書誌情報を置き換える
///
/// 貸出可否は変更しない。
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = execute_update_book(&state.service_deps, req.to_command(book_id)).await?;

    Ok(Json(BookResponse::from(book)))
}

/// PATCH /books/:id - 指定された書誌情報のみ更新
pub async fn patch_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<PatchBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = execute_update_book(&state.service_deps, req.to_command(book_id)).await?;

    Ok(Json(BookResponse::from(book)))
}

/// DELETE /books/:id - 書籍を削除
///
/// 貸出中の書籍は409。返却済みの貸出履歴も削除される。
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    execute_delete_book(&state.service_deps, BookId::from_uuid(book_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /books/:id/borrow - 書籍を借りる
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 利用者がこの書籍を既に借りていないこと
/// - 書籍が貸出可能であること
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<LoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = req.to_borrow_command(book_id);

    let loan = execute_borrow_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(loan))))
}

/// POST /books/:id/return - 書籍を返却
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 利用者がこの書籍の貸出中レコードを持っていること
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<LoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = req.to_return_command(book_id);

    let loan = execute_return_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::OK, Json(LoanResponse::from(loan))))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /books/:id - 書籍をIDで取得
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = execute_get_book(&state.service_deps, BookId::from_uuid(book_id)).await?;

    Ok(Json(BookResponse::from(book)))
}

/// GET /books/:id/loans - 書籍の貸出履歴（新しい順）
pub async fn list_book_loans(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let book_id = BookId::from_uuid(book_id);

    // 存在しない書籍は空の履歴ではなく404
    execute_get_book(&state.service_deps, book_id).await?;

    let loans = state
        .service_deps
        .loan_read_model
        .find_by_book_id(book_id)
        .await
        .map_err(|e| ApiError::from(LoanApplicationError::StoreError(e)))?;

    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// GET /loans/:id - 貸出詳細をIDで取得
///
/// 見つかった場合は貸出情報を返し、見つからない場合は404を返す。
pub async fn get_loan_by_id(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, QueryError> {
    let loan_id = LoanId::from_uuid(loan_id);

    match state.service_deps.loan_read_model.get_by_id(loan_id).await {
        Ok(Some(loan)) => Ok(Json(LoanResponse::from(loan))),
        Ok(None) => Err(QueryError::NotFound(format!(
            "Loan {} not found",
            loan_id.value()
        ))),
        Err(e) => Err(QueryError::StoreUnavailable(e)),
    }
}

/// GET /loans - 利用者の貸出履歴（新しい順）
///
/// クエリパラメータ:
/// - user_id: 利用者IDでフィルタリング（必須）
/// - active: true なら貸出中のみ、false なら返却済みのみ（オプション）
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<Vec<LoanResponse>>, QueryError> {
    // user_idを必須とする
    let user_id = query.user_id.ok_or_else(|| {
        QueryError::BadRequest("user_id query parameter is required".to_string())
    })?;

    let loans = state
        .service_deps
        .loan_read_model
        .find_by_user_id(UserId::from_uuid(user_id))
        .await
        .map_err(QueryError::StoreUnavailable)?;

    let loans = loans
        .into_iter()
        .filter(|loan| query.active.is_none_or(|active| loan.is_active() == active))
        .map(LoanResponse::from)
        .collect();

    Ok(Json(loans))
}

// ============================================================================
// Error types
// ============================================================================

/// クエリハンドラー用のエラー型
#[derive(Debug)]
pub enum QueryError {
    NotFound(String),
    BadRequest(String),
    StoreUnavailable(StoreError),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            QueryError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            QueryError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            QueryError::StoreUnavailable(e) => {
                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                tracing::error!(error = ?e, "Record store error in query handler");
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
