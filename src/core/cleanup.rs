//! Generic Cleanup Interface
//!
//! Components that own a resource which must be released on every exit path
//! (normal return, early error return, unwinding panic) implement this trait
//! and call it from their `Drop` implementation.

/// Generic trait for cleanup operations
pub trait Cleanup {
    /// Release everything held by this instance. Must be safe to call once
    /// from `Drop`; implementations log failures instead of panicking.
    fn cleanup(&self);
}
