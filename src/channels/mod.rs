//! Chat session abstraction and the Matrix transport.

pub mod channel;
pub mod matrix;

pub use channel::*;
pub use matrix::{MatrixChannel, MatrixConfig};
