//! Property test modules

mod command_line_tests;
mod layout_token_tests;
mod registry_tests;
