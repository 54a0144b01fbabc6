//! Helpers shared by the experiment runner and the test suites.
//!
//! - **`synthetic`**: generates seeded sparse-recovery problems `b = A x_true + noise`
//!   with a known sparse ground truth, and the signed coordinate atoms used to fit them.

pub mod synthetic;
