pub mod catalog;
pub mod error;
pub mod executor;
pub mod parser;
pub mod planner;
pub mod users;

pub use executor::{MemoryContext, MemoryDriver, MemoryEngine};
pub use parser::parse_sql;
pub use users::{CredentialStore, UserAccount};

#[cfg(test)]
mod tests;
