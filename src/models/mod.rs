pub mod bug;
pub mod snapshot;
