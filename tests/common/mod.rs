#![allow(dead_code)]

use scaling_bloom_rs::{FilterConfig, FilterConfigBuilder};

/// Initialize tracing for tests; safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env(),
        )
        .with_test_writer()
        .try_init();
}

pub fn test_config(capacity: u64, error_rate: f64) -> FilterConfig {
    FilterConfigBuilder::default()
        .capacity(capacity)
        .error_rate(error_rate)
        .build()
        .expect("Failed to build test config")
}

/// Deterministic test payloads so failures reproduce exactly.
pub fn generate_test_items(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("test_item_{i:06}").into_bytes())
        .collect()
}
