//! Helper functions shared by the loader, feeds and commands

mod date;
mod html;

pub use date::*;
pub use html::*;
