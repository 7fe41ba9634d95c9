// Test execution and test-command selection

pub mod executor;
pub mod selector;

pub use executor::{TestExecutor, TestOutcome, TEST_RESULTS_FILE, TIMEOUT_SENTINEL};
pub use selector::CommandSelector;
