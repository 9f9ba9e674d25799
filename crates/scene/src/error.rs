/// Failure to read a record back from its encoded bytes.
///
/// Encoding itself is infallible; decoding exists for readback and tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{layout} needs {expected} bytes, got {actual}")]
    Truncated {
        layout: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unknown {field} tag {value}")]
    UnknownTag { field: &'static str, value: u32 },
}
