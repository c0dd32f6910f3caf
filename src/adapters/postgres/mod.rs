pub mod book_repository;
pub mod loan_read_model;
pub mod loan_store;
mod rows;

use sqlx::PgPool;
use sqlx::migrate::MigrateError;

// パブリックに型を再エクスポート
pub use book_repository::BookRepository as PostgresBookRepository;
pub use loan_read_model::LoanReadModel as PostgresLoanReadModel;
pub use loan_store::LoanStore as PostgresLoanStore;

/// `migrations/` のスキーマを適用する
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
