// Core modules implementing the native bindings and their supporting helpers.
pub mod capture;
pub mod error;
pub mod output;
pub mod project;
pub mod shell;
pub mod timer;
