#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod clients;
pub mod config;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod report;
pub(crate) mod schema;
pub mod store;
pub mod taxonomy;
pub mod util;
