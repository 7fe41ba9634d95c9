// mend: an autonomous test-repair loop
//
// Runs a project's test suite, asks a completion oracle to analyze the
// failures, patches the project, and repeats until the suite is clean or an
// iteration cap is reached.

pub mod analysis;
pub mod artifact;
pub mod config;
pub mod oracle;
pub mod patch;
pub mod progress;
pub mod project;
pub mod repair;
pub mod testing;
