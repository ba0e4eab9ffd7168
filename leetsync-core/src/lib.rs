#![doc = "leetsync-core: core logic library for leetsync."]

//! This crate contains the detection, extraction, formatting and publishing
//! logic for leetsync. Concrete HTTP clients for GitHub and LeetCode live in
//! the `leetsync` binary crate and plug in through the traits in [`contract`].
//!
//! # Usage
//! Depend on this crate for anything that needs the data model or the
//! pipeline; mock the traits (`MockRepoHost`, `MockDifficultySource`,
//! `MockPageSource`) in tests.

pub mod auth;
pub mod contract;
pub mod detect;
pub mod error;
pub mod extract;
pub mod format;
pub mod publish;
pub mod store;
pub mod watch;

pub use error::{ExtractError, PublishError};
