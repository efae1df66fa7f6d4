pub mod query;
pub mod teams;
