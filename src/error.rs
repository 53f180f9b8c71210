//! Error returned by the bounds-checked accessors.

/// Failure of a checked lookup such as `DenseMap::at`.
///
/// Plain misses are reported through `Option`; this type only exists for
/// the accessors that promise a value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested key is not in the table.
    #[error("key is not present in the table")]
    OutOfRange,
}
