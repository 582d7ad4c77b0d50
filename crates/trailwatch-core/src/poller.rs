//! Blocking wait for a query execution to reach a terminal state.

use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::athena::QueryService;
use crate::error::{Result, TrailwatchError};
use crate::types::{QueryExecution, QueryState};

/// Reason reported when the service gives none for a failed execution.
pub const UNKNOWN_REASON: &str = "Unknown";

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

/// The poll loop's only suspension point.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// PollPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before every status read, including the first.
    pub interval: Duration,
    /// Time after which a still-running query is abandoned, measured from the
    /// first sleep. `None` waits indefinitely.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_wait: Some(Duration::from_secs(300)),
        }
    }
}

// ---------------------------------------------------------------------------
// wait_for_completion
// ---------------------------------------------------------------------------

/// Poll `execution_id` until it reaches a terminal state.
///
/// Each iteration sleeps `policy.interval` and then reads the status, so a
/// query that is already finished still costs one sleep. Returns the final
/// snapshot on `SUCCEEDED`; `FAILED` and `CANCELLED` become
/// [`TrailwatchError::QueryExecutionFailed`] carrying the service's reason.
/// When `policy.max_wait` is exhausted first, returns
/// [`TrailwatchError::Timeout`].
///
/// The time waited is the larger of the requested sleeps and the wall clock,
/// so slow status calls count against the limit and a zero interval still
/// ends.
pub fn wait_for_completion(
    service: &dyn QueryService,
    sleeper: &dyn Sleeper,
    execution_id: &str,
    policy: &PollPolicy,
) -> Result<QueryExecution> {
    let started = Instant::now();
    let mut slept = Duration::ZERO;

    let execution = loop {
        sleeper.sleep(policy.interval);
        slept += policy.interval;

        let execution = service.status(execution_id)?;
        debug!(execution_id, state = %execution.state, "query state");

        if execution.state.is_terminal() {
            break execution;
        }
        if let Some(max_wait) = policy.max_wait {
            let waited = slept.max(started.elapsed());
            if waited >= max_wait {
                error!(execution_id, waited_secs = waited.as_secs(), "query timed out");
                return Err(TrailwatchError::Timeout {
                    execution_id: execution_id.to_string(),
                    waited,
                });
            }
        }
    };

    if execution.state != QueryState::Succeeded {
        let reason = execution
            .failure_reason
            .clone()
            .unwrap_or_else(|| UNKNOWN_REASON.to_string());
        error!(execution_id, state = %execution.state, reason = %reason, "query did not succeed");
        return Err(TrailwatchError::QueryExecutionFailed {
            execution_id: execution_id.to_string(),
            reason,
        });
    }

    Ok(execution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athena::ResultPage;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Replays a fixed sequence of statuses; the last one repeats forever.
    struct ScriptedStatus {
        script: RefCell<VecDeque<QueryExecution>>,
        reads: Cell<usize>,
    }

    impl ScriptedStatus {
        fn new(script: Vec<QueryExecution>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                reads: Cell::new(0),
            }
        }
    }

    impl QueryService for ScriptedStatus {
        fn submit(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Ok("qe-1".into())
        }

        fn status(&self, _: &str) -> Result<QueryExecution> {
            self.reads.set(self.reads.get() + 1);
            let mut script = self.script.borrow_mut();
            if script.len() > 1 {
                Ok(script.pop_front().unwrap())
            } else {
                Ok(script.front().cloned().unwrap())
            }
        }

        fn result_page(&self, _: &str) -> Result<ResultPage> {
            Ok(ResultPage::default())
        }

        fn cancel(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSleeper {
        sleeps: RefCell<Vec<Duration>>,
    }

    impl Sleeper for CountingSleeper {
        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    fn exec(state: QueryState) -> QueryExecution {
        QueryExecution::new("qe-1", state)
    }

    fn policy(max_wait_secs: Option<u64>) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(3),
            max_wait: max_wait_secs.map(Duration::from_secs),
        }
    }

    #[test]
    fn succeeds_after_one_read_per_sleep() {
        let service = ScriptedStatus::new(vec![
            exec(QueryState::Queued),
            exec(QueryState::Running),
            exec(QueryState::Running),
            exec(QueryState::Succeeded),
        ]);
        let sleeper = CountingSleeper::default();

        let done = wait_for_completion(&service, &sleeper, "qe-1", &policy(None)).unwrap();
        assert_eq!(done.state, QueryState::Succeeded);
        assert_eq!(service.reads.get(), 4);
        assert_eq!(sleeper.sleeps.borrow().len(), 4);
        assert!(sleeper
            .sleeps
            .borrow()
            .iter()
            .all(|d| *d == Duration::from_secs(3)));
    }

    #[test]
    fn failed_state_carries_service_reason() {
        let service = ScriptedStatus::new(vec![
            exec(QueryState::Running),
            exec(QueryState::Failed).with_reason("Access denied"),
        ]);
        let sleeper = CountingSleeper::default();

        let err = wait_for_completion(&service, &sleeper, "qe-1", &policy(None)).unwrap_err();
        match err {
            TrailwatchError::QueryExecutionFailed { reason, .. } => {
                assert_eq!(reason, "Access denied")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.reads.get(), 2);
    }

    #[test]
    fn cancelled_without_reason_reports_unknown() {
        let service = ScriptedStatus::new(vec![exec(QueryState::Cancelled)]);
        let sleeper = CountingSleeper::default();

        let err = wait_for_completion(&service, &sleeper, "qe-1", &policy(None)).unwrap_err();
        assert!(matches!(
            err,
            TrailwatchError::QueryExecutionFailed { ref reason, .. } if reason == UNKNOWN_REASON
        ));
    }

    #[test]
    fn first_read_may_already_be_terminal() {
        let service = ScriptedStatus::new(vec![exec(QueryState::Succeeded)]);
        let sleeper = CountingSleeper::default();

        wait_for_completion(&service, &sleeper, "qe-1", &policy(Some(3))).unwrap();
        assert_eq!(service.reads.get(), 1);
        assert_eq!(sleeper.sleeps.borrow().len(), 1);
    }

    #[test]
    fn stuck_query_times_out() {
        let service = ScriptedStatus::new(vec![exec(QueryState::Running)]);
        let sleeper = CountingSleeper::default();

        let err = wait_for_completion(&service, &sleeper, "qe-1", &policy(Some(9))).unwrap_err();
        match err {
            TrailwatchError::Timeout {
                execution_id,
                waited,
            } => {
                assert_eq!(execution_id, "qe-1");
                assert_eq!(waited, Duration::from_secs(9));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.reads.get(), 3);
    }

    #[test]
    fn terminal_state_on_the_last_allowed_read_wins_over_timeout() {
        let service = ScriptedStatus::new(vec![
            exec(QueryState::Running),
            exec(QueryState::Succeeded),
        ]);
        let sleeper = CountingSleeper::default();

        let done = wait_for_completion(&service, &sleeper, "qe-1", &policy(Some(6))).unwrap();
        assert_eq!(done.state, QueryState::Succeeded);
    }

    #[test]
    fn zero_interval_is_bounded_by_wall_clock() {
        let service = ScriptedStatus::new(vec![exec(QueryState::Running)]);
        let policy = PollPolicy {
            interval: Duration::ZERO,
            max_wait: Some(Duration::from_millis(50)),
        };

        let err = wait_for_completion(&service, &ThreadSleeper, "qe-1", &policy).unwrap_err();
        match err {
            TrailwatchError::Timeout { waited, .. } => {
                assert!(waited >= Duration::from_millis(50))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(service.reads.get() > 1);
    }

    /// A status read that takes longer than the interval.
    struct SlowStatus(ScriptedStatus);

    impl QueryService for SlowStatus {
        fn submit(&self, q: &str, d: &str, w: &str) -> Result<String> {
            self.0.submit(q, d, w)
        }

        fn status(&self, id: &str) -> Result<QueryExecution> {
            std::thread::sleep(Duration::from_millis(40));
            self.0.status(id)
        }

        fn result_page(&self, id: &str) -> Result<ResultPage> {
            self.0.result_page(id)
        }

        fn cancel(&self, id: &str) -> Result<()> {
            self.0.cancel(id)
        }
    }

    #[test]
    fn slow_status_reads_count_against_max_wait() {
        let service = SlowStatus(ScriptedStatus::new(vec![exec(QueryState::Running)]));
        let policy = PollPolicy {
            interval: Duration::from_millis(1),
            max_wait: Some(Duration::from_millis(100)),
        };
        let sleeper = CountingSleeper::default();

        let err = wait_for_completion(&service, &sleeper, "qe-1", &policy).unwrap_err();
        assert!(matches!(err, TrailwatchError::Timeout { .. }));
        assert!(service.0.reads.get() <= 3);
    }
}
