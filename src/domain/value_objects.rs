use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::BookValidationError;

/// 貸出ID - 貸出レコードの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

/// 書籍ID - 貸出可能な1冊（物理的な1冊）の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 利用者ID - 認証済みの利用者への参照
///
/// 利用者アカウントそのものは認証レイヤーの管轄。
/// 貸出コンテキストはIDのみを知る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// ISBN（正規形）
///
/// 不変条件：
/// - ハイフン・空白を除去した10桁または13桁
/// - 数字のみ（ISBN-10の末尾のみ`X`を許容）
///
/// 正規形で保持するため、同一書籍の表記ゆれは同じ値になる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    /// 入力文字列を検証して正規形のISBNを作成する
    ///
    /// # エラー
    /// - 桁数が10でも13でもない場合は`InvalidIsbnLength`
    /// - 使用できない文字を含む場合は`InvalidIsbnCharacters`
    pub fn parse(raw: &str) -> Result<Self, BookValidationError> {
        let canonical: String = raw
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let len = canonical.chars().count();
        if len != 10 && len != 13 {
            return Err(BookValidationError::InvalidIsbnLength(len));
        }

        let valid = canonical.char_indices().all(|(i, c)| {
            c.is_ascii_digit() || (c == 'X' && len == 10 && i == len - 1)
        });
        if !valid {
            return Err(BookValidationError::InvalidIsbnCharacters);
        }

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Isbn {
    type Error = BookValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ページ数の上限（PostgreSQLのINTEGERに収まる範囲）
pub const MAX_PAGE_COUNT: u32 = i32::MAX as u32;

/// ページ数
///
/// 不変条件：1以上 `MAX_PAGE_COUNT` 以下。0ページの書籍は作成できない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageCount(u32);

impl PageCount {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for PageCount {
    type Error = BookValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(BookValidationError::NonPositivePageCount);
        }
        if value > MAX_PAGE_COUNT {
            return Err(BookValidationError::PageCountTooLarge {
                max: MAX_PAGE_COUNT,
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<i32> for PageCount {
    type Error = BookValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| BookValidationError::NonPositivePageCount)?;
        Self::try_from(value)
    }
}

impl From<PageCount> for u32 {
    fn from(count: PageCount) -> Self {
        count.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_id_creation() {
        let id1 = LoanId::new();
        let id2 = LoanId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_book_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = BookId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
    }

    #[test]
    fn test_user_id_creation() {
        let id1 = UserId::new();
        let id2 = UserId::new();
        assert_ne!(id1, id2);
    }

    // ISBN のテスト
    #[test]
    fn test_isbn_parse_isbn10() {
        let isbn = Isbn::parse("0306406152").unwrap();
        assert_eq!(isbn.as_str(), "0306406152");
    }

    #[test]
    fn test_isbn_parse_strips_hyphens_and_spaces() {
        let isbn = Isbn::parse("978-0 306-40615-7").unwrap();
        assert_eq!(isbn.as_str(), "9780306406157");
    }

    #[test]
    fn test_isbn_parse_accepts_trailing_x_for_isbn10() {
        let isbn = Isbn::parse("080442957x").unwrap();
        assert_eq!(isbn.as_str(), "080442957X");
    }

    #[test]
    fn test_isbn_parse_rejects_x_outside_check_digit() {
        let result = Isbn::parse("08044X9570");
        assert_eq!(result.unwrap_err(), BookValidationError::InvalidIsbnCharacters);

        let result = Isbn::parse("978030640615X");
        assert_eq!(result.unwrap_err(), BookValidationError::InvalidIsbnCharacters);
    }

    #[test]
    fn test_isbn_parse_rejects_wrong_length() {
        let result = Isbn::parse("12345");
        assert_eq!(result.unwrap_err(), BookValidationError::InvalidIsbnLength(5));

        let result = Isbn::parse("12345678901");
        assert_eq!(result.unwrap_err(), BookValidationError::InvalidIsbnLength(11));
    }

    #[test]
    fn test_isbn_parse_rejects_letters() {
        let result = Isbn::parse("12345abcde");
        assert_eq!(result.unwrap_err(), BookValidationError::InvalidIsbnCharacters);
    }

    // PageCount のテスト
    #[test]
    fn test_page_count_positive() {
        let count = PageCount::try_from(100u32).unwrap();
        assert_eq!(count.value(), 100);
    }

    #[test]
    fn test_page_count_rejects_zero_and_negative() {
        assert_eq!(
            PageCount::try_from(0u32).unwrap_err(),
            BookValidationError::NonPositivePageCount
        );
        assert_eq!(
            PageCount::try_from(-3i32).unwrap_err(),
            BookValidationError::NonPositivePageCount
        );
    }

    #[test]
    fn test_page_count_rejects_values_beyond_integer_column() {
        assert_eq!(
            PageCount::try_from(3_000_000_000u32).unwrap_err(),
            BookValidationError::PageCountTooLarge {
                max: MAX_PAGE_COUNT
            }
        );

        let largest = PageCount::try_from(MAX_PAGE_COUNT).unwrap();
        assert_eq!(i32::try_from(largest.value()), Ok(i32::MAX));
    }
}
