//! Integration tests for the quilt question decomposition engine

mod automation;
mod config_integration;
mod failures;
mod logging_file;
mod naming;
mod test_utils;
