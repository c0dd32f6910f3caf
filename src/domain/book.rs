use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BookId, BookValidationError, Isbn, PageCount};

/// タイトル・著者名の最大文字数
pub const MAX_TEXT_LENGTH: usize = 255;

/// Book - 貸出可能な1冊
///
/// 不変条件：`is_available == false` ⇔ この書籍を参照する貸出中のLoanが存在する。
/// `is_available` を変更できるのは貸出・返却の状態遷移のみ
/// （`set_availability` はクレート内部に閉じている）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Isbn,
    pub page_count: PageCount,
    is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// 新しい書籍を登録する（貸出可能状態で作成）
    ///
    /// # エラー
    /// タイトル・著者が空、または255文字を超える場合
    pub fn register(
        title: &str,
        author: &str,
        isbn: Isbn,
        page_count: PageCount,
        now: DateTime<Utc>,
    ) -> Result<Self, BookValidationError> {
        let title = validate_text(title, "Title", BookValidationError::BlankTitle)?;
        let author = validate_text(author, "Author", BookValidationError::BlankAuthor)?;

        Ok(Self {
            book_id: BookId::new(),
            title,
            author,
            isbn,
            page_count,
            is_available: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// 永続化層から書籍を復元する
    ///
    /// 検証済みの値のみを受け取るため、バリデーションは行わない。
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        book_id: BookId,
        title: String,
        author: String,
        isbn: Isbn,
        page_count: PageCount,
        is_available: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            book_id,
            title,
            author,
            isbn,
            page_count,
            is_available,
            created_at,
            updated_at,
        }
    }

    /// 書誌情報を更新した書籍を返す
    ///
    /// 貸出可否・作成日時は引き継ぐ。検証は `register` と同じ。
    pub fn revise(
        &self,
        title: &str,
        author: &str,
        isbn: Isbn,
        page_count: PageCount,
        now: DateTime<Utc>,
    ) -> Result<Self, BookValidationError> {
        let title = validate_text(title, "Title", BookValidationError::BlankTitle)?;
        let author = validate_text(author, "Author", BookValidationError::BlankAuthor)?;

        Ok(Self {
            title,
            author,
            isbn,
            page_count,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    /// 貸出可否を更新する
    ///
    /// 貸出・返却の状態遷移からのみ呼ばれる。
    pub(crate) fn set_availability(&mut self, available: bool, at: DateTime<Utc>) {
        self.is_available = available;
        self.updated_at = at;
    }
}

fn validate_text(
    value: &str,
    field: &'static str,
    blank: BookValidationError,
) -> Result<String, BookValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(blank);
    }
    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        return Err(BookValidationError::TooLong {
            field,
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}
