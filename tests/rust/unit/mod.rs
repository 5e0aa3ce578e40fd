//! Unit tests - pure components with no catalog or server involved
//!
//! Robustness coverage for the HTML comparison surface lives here; the
//! happy paths are covered by the `#[cfg(test)]` modules next to the code.

mod html_compare_robustness_tests;
