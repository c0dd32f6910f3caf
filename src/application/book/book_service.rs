use crate::application::ServiceDependencies;
use crate::domain::commands::{RegisterBook, UpdateBook};
use crate::domain::{Book, BookId, Isbn, PageCount};
use crate::ports::{BookDeletion, ISBN_UNIQUE_CONSTRAINT, StoreError};

use super::errors::{BookApplicationError, Result};

/// 書籍を登録する
///
/// ビジネスルール：
/// - ISBNは10桁または13桁（正規形で保存）
/// - ページ数は1以上
/// - ISBNは全書籍で一意
/// - 登録直後の書籍は貸出可能
///
/// 貸出可否を入力として受け付けない。貸出可否を変更できるのは貸出・返却のみ。
#[tracing::instrument(skip(deps, cmd), fields(isbn = %cmd.isbn))]
pub async fn register_book(deps: &ServiceDependencies, cmd: RegisterBook) -> Result<Book> {
    // 1. 値オブジェクトの検証
    let isbn = Isbn::parse(&cmd.isbn).map_err(BookApplicationError::InvalidBook)?;
    let page_count =
        PageCount::try_from(cmd.page_count).map_err(BookApplicationError::InvalidBook)?;

    // 2. ドメイン層で書籍を作成
    let book = Book::register(&cmd.title, &cmd.author, isbn, page_count, cmd.registered_at)
        .map_err(BookApplicationError::InvalidBook)?;

    // 3. 永続化（ISBNの一意性はストアの制約で保証）
    deps.book_repository
        .insert(&book)
        .await
        .map_err(|e| map_isbn_conflict(e, &book.isbn))?;

    tracing::info!(book_id = %book.book_id.value(), "Book registered");

    Ok(book)
}

/// IDで書籍を取得する
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.book_repository
        .get_by_id(book_id)
        .await
        .map_err(BookApplicationError::StoreError)?
        .ok_or(BookApplicationError::BookNotFound)
}

/// 書籍の書誌情報を更新する
///
/// 更新できるのはタイトル・著者・ISBN・ページ数のみ。指定されなかった項目は現在の値を保つ。
/// 貸出可否は貸出・返却だけが変更するため、貸出中の書籍も貸出中のまま残る。
#[tracing::instrument(skip(deps, cmd), fields(book_id = %cmd.book_id.value()))]
pub async fn update_book(deps: &ServiceDependencies, cmd: UpdateBook) -> Result<Book> {
    // 1. 現在の書籍を取得
    let current = get_book(deps, cmd.book_id).await?;

    // 2. 値オブジェクトの検証（未指定の項目は現在の値）
    let isbn = match cmd.isbn.as_deref() {
        Some(raw) => Isbn::parse(raw).map_err(BookApplicationError::InvalidBook)?,
        None => current.isbn.clone(),
    };
    let page_count = match cmd.page_count {
        Some(value) => PageCount::try_from(value).map_err(BookApplicationError::InvalidBook)?,
        None => current.page_count,
    };

    // 3. ドメイン層で書誌情報を差し替え
    let revised = current
        .revise(
            cmd.title.as_deref().unwrap_or(&current.title),
            cmd.author.as_deref().unwrap_or(&current.author),
            isbn,
            page_count,
            cmd.updated_at,
        )
        .map_err(BookApplicationError::InvalidBook)?;

    // 4. 永続化
    let updated = deps
        .book_repository
        .update_details(&revised)
        .await
        .map_err(|e| map_isbn_conflict(e, &revised.isbn))?;
    if !updated {
        return Err(BookApplicationError::BookNotFound);
    }

    tracing::info!("Book details updated");

    // 貸出可否は更新中に変わり得るため、保存後の状態を返す
    get_book(deps, cmd.book_id).await
}

/// 書籍を削除する
///
/// 貸出中の書籍は削除できない。返却済みの貸出履歴は書籍と一緒に削除される。
#[tracing::instrument(skip(deps), fields(book_id = %book_id.value()))]
pub async fn delete_book(deps: &ServiceDependencies, book_id: BookId) -> Result<()> {
    let deletion = deps
        .book_repository
        .delete_if_available(book_id)
        .await
        .map_err(BookApplicationError::StoreError)?;

    match deletion {
        BookDeletion::Deleted => {
            tracing::info!("Book deleted");
            Ok(())
        }
        BookDeletion::OnLoan => Err(BookApplicationError::BookOnLoan),
        BookDeletion::NotFound => Err(BookApplicationError::BookNotFound),
    }
}

fn map_isbn_conflict(error: StoreError, isbn: &Isbn) -> BookApplicationError {
    match error {
        StoreError::UniqueViolation { ref constraint } if constraint == ISBN_UNIQUE_CONSTRAINT => {
            BookApplicationError::DuplicateIsbn(isbn.to_string())
        }
        e => BookApplicationError::StoreError(e),
    }
}
