//! Progress reporting shared by backends.
//!
//! Backends never print. They report through [`Progress`], which forwards
//! events to an optional caller-supplied [`SolveObserver`] and logs them via
//! the `log` facade only when the configured [`Verbosity`] allows it.

use std::sync::Arc;
use std::time::Duration;

use crate::{SolveStatus, Verbosity};

/// Receives solve events; injected by the caller.
///
/// Every method has an empty default so observers implement only what they
/// need. Implementations are called from worker threads.
pub trait SolveObserver: Send + Sync {
    /// An improving solution was found.
    fn on_solution(&self, objective: i64, elapsed: Duration) {
        let _ = (objective, elapsed);
    }

    /// The search reached a terminal state.
    fn on_finish(&self, status: SolveStatus, elapsed: Duration) {
        let _ = (status, elapsed);
    }
}

/// Verbosity-gated reporter handed to backend internals.
#[derive(Clone)]
pub struct Progress {
    backend: &'static str,
    verbosity: Verbosity,
    observer: Option<Arc<dyn SolveObserver>>,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("backend", &self.backend)
            .field("verbosity", &self.verbosity)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Progress {
    /// Reporter for `backend` at the given verbosity.
    #[must_use]
    pub fn new(
        backend: &'static str,
        verbosity: Verbosity,
        observer: Option<Arc<dyn SolveObserver>>,
    ) -> Self {
        Self {
            backend,
            verbosity,
            observer,
        }
    }

    /// Report an improving solution.
    pub fn solution(&self, objective: i64, elapsed: Duration) {
        if self.verbosity.is_normal() {
            log::info!(
                "[{}] solution objective={objective} after {:.3}s",
                self.backend,
                elapsed.as_secs_f64()
            );
        }
        if let Some(observer) = &self.observer {
            observer.on_solution(objective, elapsed);
        }
    }

    /// Report the terminal state.
    pub fn finish(&self, status: SolveStatus, elapsed: Duration) {
        if self.verbosity.is_normal() {
            log::info!(
                "[{}] finished with {status:?} after {:.3}s",
                self.backend,
                elapsed.as_secs_f64()
            );
        }
        if let Some(observer) = &self.observer {
            observer.on_finish(status, elapsed);
        }
    }

    /// Free-form progress line, suppressed when quiet.
    pub fn note(&self, message: std::fmt::Arguments<'_>) {
        if self.verbosity.is_normal() {
            log::info!("[{}] {message}", self.backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use rstest::rstest;
    use std::sync::{Mutex, Once};
    use std::thread::{self, ThreadId};

    #[derive(Default)]
    struct Recorder {
        solutions: Mutex<Vec<i64>>,
        finished: Mutex<Option<SolveStatus>>,
    }

    impl SolveObserver for Recorder {
        fn on_solution(&self, objective: i64, _elapsed: Duration) {
            self.solutions.lock().expect("lock").push(objective);
        }

        fn on_finish(&self, status: SolveStatus, _elapsed: Duration) {
            *self.finished.lock().expect("lock") = Some(status);
        }
    }

    #[rstest]
    #[case(Verbosity::Quiet)]
    #[case(Verbosity::Normal)]
    fn observer_sees_events_at_every_verbosity(#[case] verbosity: Verbosity) {
        let recorder = Arc::new(Recorder::default());
        let progress = Progress::new("test", verbosity, Some(recorder.clone()));
        progress.solution(4, Duration::ZERO);
        progress.solution(9, Duration::ZERO);
        progress.finish(SolveStatus::Optimal, Duration::ZERO);
        assert_eq!(*recorder.solutions.lock().expect("lock"), vec![4, 9]);
        assert_eq!(
            *recorder.finished.lock().expect("lock"),
            Some(SolveStatus::Optimal)
        );
    }

    /// Keeps `info` and above, tagged with the emitting thread so parallel
    /// tests only see their own records.
    struct Capture {
        records: Mutex<Vec<(ThreadId, Level, String)>>,
    }

    impl Log for Capture {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.level() <= Level::Info
        }

        fn log(&self, record: &Record<'_>) {
            if self.enabled(record.metadata()) {
                self.records.lock().expect("lock").push((
                    thread::current().id(),
                    record.level(),
                    record.args().to_string(),
                ));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture {
        records: Mutex::new(Vec::new()),
    };

    fn records_from(run: impl FnOnce()) -> Vec<(Level, String)> {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&CAPTURE).expect("no other logger is installed");
            log::set_max_level(LevelFilter::Info);
        });
        run();
        let current = thread::current().id();
        CAPTURE
            .records
            .lock()
            .expect("lock")
            .iter()
            .filter(|(thread, _, _)| *thread == current)
            .map(|(_, level, message)| (*level, message.clone()))
            .collect()
    }

    fn report_everything(progress: &Progress) {
        progress.note(format_args!("3 variables"));
        progress.solution(7, Duration::from_millis(5));
        progress.finish(SolveStatus::Optimal, Duration::from_millis(9));
    }

    #[rstest]
    fn quiet_progress_emits_no_records() {
        let recorder = Arc::new(Recorder::default());
        let progress = Progress::new("test", Verbosity::Quiet, Some(recorder.clone()));
        let records = records_from(|| report_everything(&progress));
        assert!(records.is_empty(), "quiet progress logged {records:?}");
        assert_eq!(*recorder.solutions.lock().expect("lock"), vec![7]);
    }

    #[rstest]
    fn normal_progress_emits_info_records() {
        let progress = Progress::new("test", Verbosity::Normal, None);
        let records = records_from(|| report_everything(&progress));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|(level, _)| *level == Level::Info));
        assert!(records.iter().all(|(_, message)| message.starts_with("[test] ")));
        assert!(
            records
                .iter()
                .any(|(_, message)| message.contains("solution objective=7"))
        );
        assert!(
            records
                .iter()
                .any(|(_, message)| message.contains("finished with Optimal"))
        );
    }
}
