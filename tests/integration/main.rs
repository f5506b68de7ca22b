//! Integration tests for samshard.
//!
//! These tests run the built binary end to end: planning, splitting, sharding and
//! processing shard directories, plus the fatal error paths.

mod helpers;
mod test_error_paths;
mod test_plan_command;
mod test_process_command;
mod test_shard_command;
mod test_split_command;
