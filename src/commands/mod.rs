//! CLI command implementations for samshard.
//!
//! # Command Categories
//!
//! ## Planning
//! - [`plan`] - Plan balanced regions and write a region descriptor
//!
//! ## Sharding
//! - [`split`] - Stream a SAM file into shards from a region descriptor
//! - [`shard`] - Plan and shard in one in-memory pass
//!
//! ## Processing
//! - [`process`] - Sort and mark duplicates in every shard of a directory

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod plan;
pub mod process;
pub mod shard;
pub mod split;
