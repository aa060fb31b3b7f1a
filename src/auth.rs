//! Access-token models cached by a session.

pub mod token;

pub use token::{record::*, secret::*};
