use crate::domain::{Book, BookId};
use async_trait::async_trait;

use super::loan_store::Result;

/// 書籍削除の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookDeletion {
    /// 削除した（返却済みの貸出履歴も削除される）
    Deleted,
    /// 書籍が存在しない
    NotFound,
    /// 貸出中のため削除しなかった
    OnLoan,
}

/// 書籍リポジトリポート
///
/// 書籍の登録・書誌情報の更新・削除と参照。
/// 貸出可否の変更は扱わない（LoanTransaction の責務）。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 書籍を登録する
    ///
    /// ISBNが重複する場合は `StoreError::UniqueViolation` を返す。
    async fn insert(&self, book: &Book) -> Result<()>;

    /// IDで書籍を取得する
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 書誌情報（タイトル・著者・ISBN・ページ数・更新日時）のみを書き込む
    ///
    /// 保存済みの貸出可否は変更しない。書籍が存在しなければ `false`。
    /// ISBNが他の書籍と重複する場合は `StoreError::UniqueViolation` を返す。
    async fn update_details(&self, book: &Book) -> Result<bool>;

    /// 貸出中でない書籍を、その貸出履歴ごと削除する
    ///
    /// 貸出可否の確認と削除は並行する貸出に対して原子的に行われる。
    async fn delete_if_available(&self, book_id: BookId) -> Result<BookDeletion>;
}
