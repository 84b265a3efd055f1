//! A handle to a pooled resource that returns it to the pool, rather than
//! destroying it, on final release.

/// Wraps a value of type `T` together with a "return to pool" callback.
///
/// `dispose` is idempotent: only the first call (whether explicit or via
/// `Drop`) invokes the callback. This lets [`crate::snapshot::Ref`] call
/// `dispose` when the last reference drops without needing to track
/// whether it already happened.
pub struct Lease<T> {
    value: Option<T>,
    return_to_pool: Option<Box<dyn FnOnce(T) + Send>>,
}

impl<T> Lease<T> {
    /// Wraps `value`; `return_to_pool` runs exactly once, on first dispose.
    pub fn new(value: T, return_to_pool: impl FnOnce(T) + Send + 'static) -> Self {
        Self {
            value: Some(value),
            return_to_pool: Some(Box::new(return_to_pool)),
        }
    }

    /// Wraps a value with no pool to return to — disposing it simply drops
    /// the value. Used for leases built outside a `LayerPool` (e.g. tests).
    pub fn detached(value: T) -> Self {
        Self {
            value: Some(value),
            return_to_pool: None,
        }
    }

    #[must_use]
    pub fn get(&self) -> &T {
        self.value
            .as_ref()
            .expect("Lease accessed after dispose")
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.value
            .as_mut()
            .expect("Lease accessed after dispose")
    }

    /// Returns the resource to the pool (or just drops it, if detached).
    /// Safe to call more than once; only the first call has any effect.
    pub fn dispose(&mut self) {
        if let Some(value) = self.value.take() {
            if let Some(cb) = self.return_to_pool.take() {
                cb(value);
            }
            // else: detached lease, value is simply dropped here.
        }
    }
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}
