use derive_builder::Builder;

use crate::error::Result;
use crate::params::FilterParameters;

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct FilterConfig {
    /// Maximum number of elements (per generation, for scaling filters)
    #[builder(default = "1_000_000")]
    pub capacity: u64,

    /// Target false positive rate (0.0 to 1.0, exclusive)
    #[builder(default = "0.01")]
    pub error_rate: f64,
}

impl FilterConfig {
    pub fn new(capacity: u64, error_rate: f64) -> Self {
        Self {
            capacity,
            error_rate,
        }
    }

    /// Validates the configuration by deriving the filter parameters it
    /// implies. Returns the derived parameters on success.
    pub fn validate(&self) -> Result<FilterParameters> {
        FilterParameters::derive(self.capacity, self.error_rate)
    }
}
