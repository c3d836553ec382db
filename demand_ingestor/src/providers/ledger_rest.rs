//! REST client for the sales ledger service.

pub mod provider;
pub mod response;

pub use provider::LedgerRestProvider;
