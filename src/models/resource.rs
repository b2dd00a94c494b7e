/// Tri-state outcome of an asynchronous read: pending, succeeded, or failed.
/// Streams returned by the repository emit `Loading` first and finish with
/// exactly one of the terminal variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error(String),
}
