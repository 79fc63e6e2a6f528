pub mod expr;
pub use expr::*;

pub mod format;
