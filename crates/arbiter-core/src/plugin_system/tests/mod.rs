pub mod namespace_tests;
pub mod error_handler_tests;
