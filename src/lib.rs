//! `@file` mention tagging for chat input.
//!
//! [`mention`] is the standalone scanner used while typing and when a
//! message is sent. [`attachments`] and [`dispatcher`] take the extracted tags
//! the rest of the way: matching them against the files a project has, then
//! reading those files into prompt content.

pub mod attachments;
pub mod config;
pub mod dispatcher;
pub mod logging;
pub mod mention;
pub mod paths;
pub mod workspace;
