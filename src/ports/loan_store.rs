use crate::domain::{Book, BookId, Loan, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// 書籍ISBNの一意制約名
pub const ISBN_UNIQUE_CONSTRAINT: &str = "books_isbn_key";

/// 1冊につき貸出中レコードは1件までという一意制約名
pub const OPEN_LOAN_UNIQUE_CONSTRAINT: &str = "loans_one_open_loan_per_book";

/// レコードストアのエラー
///
/// 貸出ルール違反（AlreadyBorrowed など）とは別のインフラ障害カテゴリ。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 一意制約違反
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// 並行トランザクションとの競合（再試行で解消しうる）
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// ストアへの接続・クエリの失敗
    #[error("record store error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// 新しいトランザクションで再試行すべき競合か
    ///
    /// 貸出中一意制約の違反は、並行する貸出が先にコミットしたことを意味する。
    pub fn is_conflict(&self) -> bool {
        match self {
            StoreError::Conflict(_) => true,
            StoreError::UniqueViolation { constraint } => constraint == OPEN_LOAN_UNIQUE_CONSTRAINT,
            StoreError::Backend(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// 貸出ストアポート
///
/// BookとLoanに対する原子的な読み取り・変更・書き込みを提供する。
/// プロセス起動時に構築され、サービスへ明示的に注入される。
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// トランザクションを開始する
    ///
    /// トランザクションが排他の単位。アプリケーション側で追加のロックは取らない。
    async fn begin(&self) -> Result<Box<dyn LoanTransaction>>;
}

/// 貸出トランザクション
///
/// `commit` されずにドロップされた場合はロールバックされ、
/// 書き込みは一切反映されない（早期リターン・キャンセルを含む）。
#[async_trait]
pub trait LoanTransaction: Send {
    /// 書籍を取得し、トランザクション終了まで同じ書籍への並行な貸出・返却を待たせる
    async fn find_book_for_update(&mut self, book_id: BookId) -> Result<Option<Book>>;

    /// (user, book) の貸出中レコードを取得する
    async fn find_open_loan(&mut self, user_id: UserId, book_id: BookId) -> Result<Option<Loan>>;

    /// 新しい貸出を追加する
    async fn insert_loan(&mut self, loan: &Loan) -> Result<()>;

    /// 貸出を更新する（返却日時の設定）
    async fn update_loan(&mut self, loan: &Loan) -> Result<()>;

    /// 書籍の貸出可否を更新する
    async fn update_book(&mut self, book: &Book) -> Result<()>;

    /// コミットする。成功した場合のみ書き込みが確定する。
    async fn commit(self: Box<Self>) -> Result<()>;
}
