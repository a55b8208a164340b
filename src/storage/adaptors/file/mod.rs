mod file_store;
pub use file_store::*;

#[cfg(test)]
mod file_store_test;
