pub mod ledger_sink;
pub mod sink;
