pub mod archive;
pub mod commands;
pub mod config;
pub mod http;
pub mod install;
pub mod package;
pub mod runtime;
pub mod source;
pub mod store;
