mod book_service;
mod errors;

pub use book_service::{delete_book, get_book, register_book, update_book};
pub use errors::{BookApplicationError, Result};
