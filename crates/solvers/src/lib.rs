//! Shipped max-cut solvers.
//!
//! Both implement [`optibench_core::Algorithm`] and are stateless, so a
//! single instance can be registered once and executed across many work
//! units concurrently.

pub mod greedy;
pub mod random_search;

pub use greedy::GreedyCut;
pub use random_search::RandomSearch;
