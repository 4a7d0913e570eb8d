use std::time::Duration;

use probe_client::{Session, TranscribeTarget};
use probe_core::{RunReport, RunState, TestCase};
use tracing::{debug, error, info};

/// Drives a run: one login, then every case in order, one at a time.
pub struct Harness<T> {
    target: T,
    session: Session,
    delay: Duration,
    state: RunState,
}

impl<T: TranscribeTarget> Harness<T> {
    /// Create a harness. `delay` is the pause between consecutive cases.
    pub fn new(target: T, session: Session, delay: Duration) -> Self {
        Self {
            target,
            session,
            delay,
            state: RunState::NotAuthenticated,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
        if next.is_terminal() {
            info!(state = ?next, "Run finished");
        }
    }

    /// Log in, then upload a synthetic payload for each case.
    ///
    /// A failed login aborts the run before any upload. Per-case failures
    /// are recorded and the run continues.
    pub async fn run_all(&mut self, cases: &[TestCase]) -> RunReport {
        info!(
            backend = self.target.name(),
            base_url = self.session.base_url(),
            cases = cases.len(),
            "Starting transcribe endpoint run"
        );

        if let Err(e) = self.target.authenticate(&mut self.session).await {
            error!(error = %e, "Failed to authenticate. Aborting run.");
            self.advance(RunState::AuthFailed);
            return RunReport::auth_failed();
        }
        self.advance(RunState::Authenticated);

        let mut results = Vec::with_capacity(cases.len());
        for (i, case) in cases.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.advance(RunState::Generating(i));
            info!(
                case = %case.name,
                bytes = case.size_bytes,
                kb = case.size_bytes as f64 / 1024.0,
                "Generating payload"
            );
            let payload = probe_payload::generate(case.size_bytes);

            self.advance(RunState::Submitting(i));
            let result = self
                .target
                .submit(&self.session, payload, &case.filename, &case.name)
                .await;

            results.push(result);
            self.advance(RunState::Recorded(i));
        }

        self.advance(RunState::Summarizing);
        let report = RunReport::from_results(results);
        self.advance(RunState::Done);

        report
    }
}
