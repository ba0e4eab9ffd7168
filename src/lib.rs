pub mod cli;
pub mod github;
pub mod leetcode;
pub mod load_config;

pub use cli::{run, Cli, Commands};
