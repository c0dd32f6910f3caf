pub mod book;
mod dependencies;
pub mod loan;

pub use dependencies::{DEFAULT_MAX_TRANSACTION_ATTEMPTS, ServiceDependencies};
