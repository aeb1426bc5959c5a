use serde::{Deserialize, Serialize};

/// Number of cleaned events recorded in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearFrequency {
    pub year: i32,
    pub count: u64,
}
