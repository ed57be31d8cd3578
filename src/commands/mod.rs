//! CLI subcommands

pub mod clean;
pub mod feed;
pub mod list;
pub mod new;
pub mod search;
pub mod snapshot;
