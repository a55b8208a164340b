mod mem_store;
pub use mem_store::*;

#[cfg(test)]
mod mem_store_test;
