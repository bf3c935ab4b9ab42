use serde::Serialize;

/// `{"data": ...}` envelope used by every successful JSON response.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Result of a bulk operation: `{"affected": n}`.
#[derive(Debug, Serialize)]
pub struct Affected {
    pub affected: u64,
}
