use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// Records the `covmark` field of every event, e.g. `trace!(covmark = "userpass_rejected")`.
#[derive(Clone, Debug, Default)]
pub struct CovMarkLayer {
    records: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone, Debug)]
pub struct CovMarkHandle {
    records: Arc<Mutex<Vec<String>>>,
}

/// Installs a [`CovMarkLayer`] as the default subscriber for the current thread.
///
/// Use with a current-thread runtime (the `#[tokio::test]` default) so that spawned tasks
/// report to the same subscriber.
pub fn init_cov_mark() -> (CovMarkHandle, DefaultGuard) {
    let layer = CovMarkLayer::default();
    let handle = layer.handle();
    let guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));
    (handle, guard)
}

impl CovMarkLayer {
    pub fn handle(&self) -> CovMarkHandle {
        CovMarkHandle {
            records: Arc::clone(&self.records),
        }
    }
}

impl<S: Subscriber> Layer<S> for CovMarkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = CovMarkVisitor { mark: None };
        event.record(&mut visitor);

        if let Some(mark) = visitor.mark {
            self.records.lock().push(mark);
        }
    }
}

impl CovMarkHandle {
    /// Consumes one occurrence of `covmark`, panicking if it was never emitted.
    #[track_caller]
    pub fn assert_mark(&self, covmark: &str) {
        let mut records = self.records.lock();
        let idx = records
            .iter()
            .position(|mark| mark == covmark)
            .unwrap_or_else(|| panic!("coverage marker `{covmark}` not emitted (got {records:?})"));
        records.remove(idx);
    }

    #[track_caller]
    pub fn assert_no_mark(&self, covmark: &str) {
        let records = self.records.lock();
        assert!(
            !records.iter().any(|mark| mark == covmark),
            "coverage marker `{covmark}` unexpectedly emitted"
        );
    }
}

struct CovMarkVisitor {
    mark: Option<String>,
}

impl Visit for CovMarkVisitor {
    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "covmark" {
            self.mark = Some(value.to_owned());
        }
    }
}
