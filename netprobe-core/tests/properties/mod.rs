//! Property test modules

mod config_tests;
mod exposition_tests;
mod parser_tests;
mod prompt_tests;
