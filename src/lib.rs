pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod problem;
pub mod report;
pub mod search;
pub mod service;
pub mod sink;
pub mod util;
