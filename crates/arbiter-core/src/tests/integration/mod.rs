#![cfg(test)]

pub mod common;
pub mod engine_tests;
pub mod property_tests;
