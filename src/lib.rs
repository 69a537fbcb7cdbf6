#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod enumerate;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod session;
