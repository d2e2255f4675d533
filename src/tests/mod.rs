pub mod common;

mod config_validation;
mod token_lifecycle;
