pub mod aggregate;
pub mod bundle;
pub mod error;
pub mod fusion;
