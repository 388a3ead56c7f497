pub mod cli;
pub mod config;
pub mod credential;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod recover;
pub mod report;
pub mod scan;
pub mod schema;
pub mod service;
pub mod util;
