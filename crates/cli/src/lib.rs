//! Shared pieces of the quiesce CLI

pub mod system_config;
