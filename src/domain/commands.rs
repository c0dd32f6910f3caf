use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, UserId};

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub user_id: UserId,
    pub book_id: BookId,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：書籍を登録する
///
/// ISBN・ページ数は未検証の生の値。検証は登録処理で行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub page_count: u32,
    pub registered_at: DateTime<Utc>,
}

/// コマンド：書籍の書誌情報を更新する
///
/// `None` の項目は現在の値を保つ。貸出可否は含まない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBook {
    pub book_id: BookId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub page_count: Option<u32>,
    pub updated_at: DateTime<Utc>,
}
