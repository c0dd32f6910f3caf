pub mod book_repository;
pub mod loan_read_model;
pub mod loan_store;

pub use book_repository::*;
pub use loan_read_model::*;
pub use loan_store::{
    ISBN_UNIQUE_CONSTRAINT, LoanStore, LoanTransaction, OPEN_LOAN_UNIQUE_CONSTRAINT, StoreError,
};
