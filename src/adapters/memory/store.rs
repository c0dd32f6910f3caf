use crate::domain::{Book, BookId, Loan, LoanId, UserId};
use crate::ports::loan_store::Result;
use crate::ports::{
    BookDeletion, BookRepository, ISBN_UNIQUE_CONSTRAINT, LoanReadModel, LoanStore, LoanTransaction,
    OPEN_LOAN_UNIQUE_CONSTRAINT, StoreError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Snapshot of every record held by the store
#[derive(Debug, Clone, Default)]
struct State {
    books: HashMap<BookId, Book>,
    loans: HashMap<LoanId, Loan>,
}

impl State {
    fn has_open_loan_for_book(&self, book_id: BookId) -> bool {
        self.loans
            .values()
            .any(|loan| loan.book_id == book_id && loan.is_active())
    }
}

/// In-memory implementation of the record store ports
///
/// A transaction holds the store's async mutex for its whole lifetime and
/// works on a staged copy of the state. Commit publishes the copy; dropping
/// the transaction discards it. The same uniqueness rules as the PostgreSQL
/// schema are enforced (ISBN, one open loan per book).
///
/// Used by the `memory` storage backend and by the test suites.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a book record as-is, bypassing registration rules
    ///
    /// Lets tests seed states such as an unavailable book with no loan.
    pub async fn put_book(&self, book: Book) {
        self.state.lock().await.books.insert(book.book_id, book);
    }

    /// All open loans referencing the book
    pub async fn open_loans_for_book(&self, book_id: BookId) -> Vec<Loan> {
        self.state
            .lock()
            .await
            .loans
            .values()
            .filter(|loan| loan.book_id == book_id && loan.is_active())
            .cloned()
            .collect()
    }

    /// Make the commit of the next transaction fail with a backend error
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

/// Transaction over the in-memory store
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<State>,
    staged: State,
    fail_commit: bool,
}

#[async_trait]
impl LoanStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn LoanTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        let fail_commit = self.fail_next_commit.swap(false, Ordering::SeqCst);

        Ok(Box::new(InMemoryTransaction {
            guard,
            staged,
            fail_commit,
        }))
    }
}

#[async_trait]
impl LoanTransaction for InMemoryTransaction {
    async fn find_book_for_update(&mut self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.staged.books.get(&book_id).cloned())
    }

    async fn find_open_loan(&mut self, user_id: UserId, book_id: BookId) -> Result<Option<Loan>> {
        Ok(self
            .staged
            .loans
            .values()
            .find(|loan| loan.user_id == user_id && loan.book_id == book_id && loan.is_active())
            .cloned())
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<()> {
        if loan.is_active() && self.staged.has_open_loan_for_book(loan.book_id) {
            return Err(StoreError::UniqueViolation {
                constraint: OPEN_LOAN_UNIQUE_CONSTRAINT.to_string(),
            });
        }
        self.staged.loans.insert(loan.loan_id, loan.clone());
        Ok(())
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        match self.staged.loans.get_mut(&loan.loan_id) {
            Some(stored) => {
                *stored = loan.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(
                format!("loan {} does not exist", loan.loan_id.value()).into(),
            )),
        }
    }

    async fn update_book(&mut self, book: &Book) -> Result<()> {
        match self.staged.books.get_mut(&book.book_id) {
            Some(stored) => {
                *stored = book.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(
                format!("book {} does not exist", book.book_id.value()).into(),
            )),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.fail_commit {
            return Err(StoreError::Backend("injected commit failure".into()));
        }

        let InMemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryStore {
    async fn insert(&self, book: &Book) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.books.values().any(|stored| stored.isbn == book.isbn) {
            return Err(StoreError::UniqueViolation {
                constraint: ISBN_UNIQUE_CONSTRAINT.to_string(),
            });
        }
        state.books.insert(book.book_id, book.clone());
        Ok(())
    }

    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.state.lock().await.books.get(&book_id).cloned())
    }

    async fn update_details(&self, book: &Book) -> Result<bool> {
        let mut state = self.state.lock().await;

        if state
            .books
            .values()
            .any(|stored| stored.book_id != book.book_id && stored.isbn == book.isbn)
        {
            return Err(StoreError::UniqueViolation {
                constraint: ISBN_UNIQUE_CONSTRAINT.to_string(),
            });
        }

        let Some(stored) = state.books.get_mut(&book.book_id) else {
            return Ok(false);
        };
        stored.title = book.title.clone();
        stored.author = book.author.clone();
        stored.isbn = book.isbn.clone();
        stored.page_count = book.page_count;
        stored.updated_at = book.updated_at;
        Ok(true)
    }

    async fn delete_if_available(&self, book_id: BookId) -> Result<BookDeletion> {
        let mut state = self.state.lock().await;

        match state.books.get(&book_id) {
            None => return Ok(BookDeletion::NotFound),
            Some(book) if !book.is_available() => return Ok(BookDeletion::OnLoan),
            Some(_) => {}
        }

        state.books.remove(&book_id);
        state.loans.retain(|_, loan| loan.book_id != book_id);
        Ok(BookDeletion::Deleted)
    }
}

#[async_trait]
impl LoanReadModel for InMemoryStore {
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.state.lock().await.loans.get(&loan_id).cloned())
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state.loans.values().filter(|loan| loan.user_id == user_id),
        ))
    }

    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state.loans.values().filter(|loan| loan.book_id == book_id),
        ))
    }
}

fn newest_first<'a>(loans: impl Iterator<Item = &'a Loan>) -> Vec<Loan> {
    let mut loans: Vec<Loan> = loans.cloned().collect();
    loans.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at));
    loans
}
