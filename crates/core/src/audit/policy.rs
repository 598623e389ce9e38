/// What the audit wrapper does when the wrapped unit of work fails.
///
/// In both cases the audit record ends `failed` with the error text.
pub enum ErrorPolicy<T> {
    /// Swallow the error and return the value built from the error text.
    /// Used where every caller needs a result to aggregate (health checks).
    MustReturnResult(fn(&str) -> T),

    /// Hand the original error back to the caller unchanged. Used where the
    /// caller owns error handling (analyses).
    CallerHandlesErrors,
}

impl<T> ErrorPolicy<T> {
    pub fn must_return_result(fallback: fn(&str) -> T) -> Self {
        ErrorPolicy::MustReturnResult(fallback)
    }

    pub fn caller_handles_errors() -> Self {
        ErrorPolicy::CallerHandlesErrors
    }
}

impl<T> std::fmt::Debug for ErrorPolicy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::MustReturnResult(_) => f.write_str("MustReturnResult"),
            ErrorPolicy::CallerHandlesErrors => f.write_str("CallerHandlesErrors"),
        }
    }
}
