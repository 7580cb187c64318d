//! CLI subcommands

pub mod health;
pub mod schema;
pub mod score;
