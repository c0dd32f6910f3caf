use crate::domain::{BookId, Loan, LoanId, UserId};
use async_trait::async_trait;

use super::loan_store::Result;

/// 貸出照会ポート
///
/// 貸出履歴の参照専用。結果は貸出日時の新しい順。
#[async_trait]
pub trait LoanReadModel: Send + Sync {
    /// IDで貸出を取得する
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 利用者の全貸出を検索する
    ///
    /// 利用者の貸出履歴表示に使用される。
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<Loan>>;

    /// 書籍の全貸出を検索する
    ///
    /// 書籍の貸出履歴表示に使用される。
    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>>;
}
