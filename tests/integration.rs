#[path = "integration/api_tests.rs"]
mod api_tests;
