use std::time::Duration;

use time::OffsetDateTime;

/// Wall clock plus an awaitable sleep, so retention and fan-out timing can be
/// driven by hand in tests.
pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}
