use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, borrow_book, delete_book, get_book, get_loan_by_id, list_book_loans, list_loans,
    patch_book, register_book, return_book, update_book,
};

/// Creates the API router with all book and loan endpoints
///
/// Command endpoints (Write operations):
/// - POST /books - Register a book
/// - PUT /books/:id - Replace a book's details
/// - PATCH /books/:id - Update some of a book's details
/// - DELETE /books/:id - Delete a book that is not on loan
/// - POST /books/:id/borrow - Borrow a book
/// - POST /books/:id/return - Return a book
///
/// Query endpoints (Read operations):
/// - GET /books/:id - Get book details
/// - GET /books/:id/loans - Loan history of a book
/// - GET /loans - Loan history of a user
/// - GET /loans/:id - Get loan details
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Book endpoints
        .route("/books", post(register_book))
        .route(
            "/books/:id",
            get(get_book)
                .put(update_book)
                .patch(patch_book)
                .delete(delete_book),
        )
        .route("/books/:id/borrow", post(borrow_book))
        .route("/books/:id/return", post(return_book))
        .route("/books/:id/loans", get(list_book_loans))
        // Loan query endpoints
        .route("/loans", get(list_loans))
        .route("/loans/:id", get(get_loan_by_id))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
