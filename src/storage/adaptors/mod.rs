mod file;
mod mem;
mod unavailable;

pub use file::*;
pub use mem::*;
pub use unavailable::*;
