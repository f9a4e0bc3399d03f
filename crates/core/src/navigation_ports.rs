//! Navigation port for the two page-level side effects the client needs:
//! redirecting to the login page and reloading after a CSRF failure.

/// Page navigation performed by the embedding UI.
pub trait Navigator: Send + Sync {
    /// Navigate to `path` on the current origin.
    fn redirect(&self, path: &str);

    /// Reload the current page.
    fn reload(&self);
}

/// Navigator that does nothing. Default for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect(&self, _path: &str) {}

    fn reload(&self) {}
}
