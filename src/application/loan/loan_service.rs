use crate::application::ServiceDependencies;
use crate::domain::{self, Loan, commands::*};
use std::future::Future;

use super::errors::{LoanApplicationError, Result};

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 利用者がこの書籍を既に借りていないこと（AlreadyBorrowed）
/// - 書籍が貸出可能であること（BookUnavailable）
///
/// # 一貫性保証
///
/// 読み取り（貸出中レコード・貸出可否）と書き込み（Loan作成・Book更新）は
/// すべて1つのトランザクション内で行われる。書籍は更新用に取得されるため、
/// 同じ書籍への並行な貸出は直列化され、成功するのは1件のみ。
/// 失敗時は何も書き込まれない。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 貸出コマンド
///
/// # 戻り値
/// 作成された貸出
#[tracing::instrument(
    skip(deps, cmd),
    fields(user_id = %cmd.user_id.value(), book_id = %cmd.book_id.value())
)]
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<Loan> {
    let cmd = &cmd;
    let result =
        with_conflict_retry(deps.max_transaction_attempts, move || try_borrow_book(deps, cmd))
            .await;

    match &result {
        Ok(loan) => tracing::info!(loan_id = %loan.loan_id.value(), "Book borrowed"),
        Err(e) if !e.is_retryable() => tracing::debug!(error = %e, "Borrow rejected"),
        Err(_) => {}
    }

    result
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - (user, book) の貸出中レコードがあること（NoActiveLoan）
///   未貸出・返却済み・他の利用者の貸出は区別しない
///
/// # 一貫性保証
///
/// 返却日時の設定と書籍の貸出可能化は1つのトランザクションで確定する。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 返却コマンド
///
/// # 戻り値
/// 返却済みとなった貸出
#[tracing::instrument(
    skip(deps, cmd),
    fields(user_id = %cmd.user_id.value(), book_id = %cmd.book_id.value())
)]
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<Loan> {
    let cmd = &cmd;
    let result =
        with_conflict_retry(deps.max_transaction_attempts, move || try_return_book(deps, cmd))
            .await;

    match &result {
        Ok(loan) => tracing::info!(loan_id = %loan.loan_id.value(), "Book returned"),
        Err(e) if !e.is_retryable() => tracing::debug!(error = %e, "Return rejected"),
        Err(_) => {}
    }

    result
}

/// 1回分の貸出トランザクション
async fn try_borrow_book(deps: &ServiceDependencies, cmd: &BorrowBook) -> Result<Loan> {
    let mut tx = deps
        .loan_store
        .begin()
        .await
        .map_err(LoanApplicationError::StoreError)?;

    // 1. 書籍を更新用に取得（同じ書籍への並行操作はここで待つ）
    let book = tx
        .find_book_for_update(cmd.book_id)
        .await
        .map_err(LoanApplicationError::StoreError)?
        .ok_or(LoanApplicationError::BookNotFound)?;

    // 2. 利用者の貸出中レコードを確認
    let open_loan = tx
        .find_open_loan(cmd.user_id, cmd.book_id)
        .await
        .map_err(LoanApplicationError::StoreError)?;

    // 3. ドメイン層の純粋関数を呼び出し（エラー時は tx のドロップでロールバック）
    let (loan, book) =
        domain::loan::borrow_book(cmd.user_id, &book, open_loan.as_ref(), cmd.borrowed_at)?;

    // 4. 書き込みとコミット
    tx.insert_loan(&loan)
        .await
        .map_err(LoanApplicationError::StoreError)?;
    tx.update_book(&book)
        .await
        .map_err(LoanApplicationError::StoreError)?;
    tx.commit().await.map_err(LoanApplicationError::StoreError)?;

    Ok(loan)
}

/// 1回分の返却トランザクション
async fn try_return_book(deps: &ServiceDependencies, cmd: &ReturnBook) -> Result<Loan> {
    let mut tx = deps
        .loan_store
        .begin()
        .await
        .map_err(LoanApplicationError::StoreError)?;

    let book = tx
        .find_book_for_update(cmd.book_id)
        .await
        .map_err(LoanApplicationError::StoreError)?
        .ok_or(LoanApplicationError::BookNotFound)?;

    let open_loan = tx
        .find_open_loan(cmd.user_id, cmd.book_id)
        .await
        .map_err(LoanApplicationError::StoreError)?;

    let (loan, book) = domain::loan::return_book(cmd.user_id, &book, open_loan, cmd.returned_at)?;

    tx.update_loan(&loan)
        .await
        .map_err(LoanApplicationError::StoreError)?;
    tx.update_book(&book)
        .await
        .map_err(LoanApplicationError::StoreError)?;
    tx.commit().await.map_err(LoanApplicationError::StoreError)?;

    Ok(loan)
}

/// 競合エラーの場合のみ、新しいトランザクションで再試行する
///
/// 業務ルール違反と競合以外のストア障害は即座に返す。
/// 試行回数を使い切った場合は最後の競合エラーを返す。
async fn with_conflict_retry<T, F, Fut>(max_attempts: u32, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Err(LoanApplicationError::StoreError(e)) if e.is_conflict() && attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = %e, "Transaction conflict, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_stops_after_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = with_conflict_retry(3, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(LoanApplicationError::StoreError(StoreError::Conflict(
                    "serialization failure".to_string(),
                )))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = with_conflict_retry(3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LoanApplicationError::StoreError(StoreError::Conflict(
                "deadlock detected".to_string(),
            )))
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_business_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = with_conflict_retry(3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LoanApplicationError::BookUnavailable)
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            LoanApplicationError::BookUnavailable
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_backend_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = with_conflict_retry(3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LoanApplicationError::StoreError(StoreError::Backend(
                "connection refused".into(),
            )))
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = with_conflict_retry(0, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
