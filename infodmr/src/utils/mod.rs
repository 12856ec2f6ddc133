//! This module contains utility functions and helper macros used throughout
//! the infodmr crate.
//!
//! Key functionalities include:
//!
//! - The crate-wide Rayon thread pool used for per-chromosome work.
//! - Numeric helpers for the logit scale and normal densities.
//! - Macros for builder-style `with_*` setters on configuration structs.

use once_cell::sync::Lazy;
use rayon::{
    ThreadPool,
    ThreadPoolBuilder,
};

mod stats;
pub use stats::*;

/// Environment variable holding the number of worker threads. Unset or `0`
/// lets Rayon pick.
pub const NUM_THREADS_ENV: &str = "INFODMR_NUM_THREADS";

pub static THREAD_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    let num_threads: Option<usize> = std::env::var(NUM_THREADS_ENV)
        .ok()
        .and_then(|str| str.parse::<usize>().ok());
    ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .expect("Failed to create thread pool")
});

pub fn n_threads() -> usize {
    THREAD_POOL.current_num_threads()
}

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
            self.$field_name = value;
            self
            }
        }
    };
}
