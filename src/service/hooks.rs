//! Optional per-step instrumentation of the pipelines.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Observer notified around each named pipeline step.
pub trait StepHook: Send + Sync {
    fn on_step_start(&self, step: &str);

    fn on_step_end(&self, step: &str, elapsed: Duration, succeeded: bool);
}

/// Logs step durations through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl StepHook for TracingHook {
    fn on_step_start(&self, step: &str) {
        debug!(step, "step started");
    }

    fn on_step_end(&self, step: &str, elapsed: Duration, succeeded: bool) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if succeeded {
            debug!(step, elapsed_ms, "step finished");
        } else {
            warn!(step, elapsed_ms, "step failed");
        }
    }
}

/// Ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl StepHook for NoopHook {
    fn on_step_start(&self, _step: &str) {}

    fn on_step_end(&self, _step: &str, _elapsed: Duration, _succeeded: bool) {}
}

/// Run `f` as the step `name`, reporting to `hook`.
pub(crate) fn timed<T, E>(
    hook: &dyn StepHook,
    name: &str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    hook.on_step_start(name);
    let started = Instant::now();
    let result = f();
    hook.on_step_end(name, started.elapsed(), result.is_ok());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, bool)>>);

    impl StepHook for Recorder {
        fn on_step_start(&self, step: &str) {
            self.0.lock().push((format!("start:{step}"), true));
        }

        fn on_step_end(&self, step: &str, _elapsed: Duration, succeeded: bool) {
            self.0.lock().push((format!("end:{step}"), succeeded));
        }
    }

    #[test]
    fn timed_reports_start_and_outcome() {
        let hook = Recorder::default();
        let ok: Result<u8, ()> = timed(&hook, "a", || Ok(1));
        let err: Result<u8, ()> = timed(&hook, "b", || Err(()));

        assert_eq!(ok, Ok(1));
        assert!(err.is_err());
        assert_eq!(
            *hook.0.lock(),
            vec![
                ("start:a".to_string(), true),
                ("end:a".to_string(), true),
                ("start:b".to_string(), true),
                ("end:b".to_string(), false),
            ]
        );
    }
}
