pub mod paged;
pub mod retry;
