mod basic_tests;
mod scanner_tests;
