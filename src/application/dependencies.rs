use crate::ports::{BookRepository, LoanReadModel, LoanStore};
use std::sync::Arc;

/// 競合時のトランザクション試行回数（初回を含む）の既定値
pub const DEFAULT_MAX_TRANSACTION_ATTEMPTS: u32 = 3;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、関数に依存関係を渡す。
///
/// ストアのハンドルはプロセス起動時に構築され、ここから明示的に注入される。
/// プロセス全体の暗黙の接続状態は持たない。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_store: Arc<dyn LoanStore>,
    pub book_repository: Arc<dyn BookRepository>,
    pub loan_read_model: Arc<dyn LoanReadModel>,
    /// 競合（シリアライズ失敗など）時に新しいトランザクションで試行する最大回数
    pub max_transaction_attempts: u32,
}
