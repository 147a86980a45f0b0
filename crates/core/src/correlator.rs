//! Matches pushed job notifications against the one job a session is
//! waiting on.
//!
//! A [`ResultCorrelator`] tracks at most one outstanding job. Events for
//! any other job id are dropped. A terminal status forgets the job, so at
//! most one `Completed` event is ever acted upon per tracked job.

use crate::job::{JobNotification, JobStatus};
use crate::types::JobId;

/// Invoked for every event that passes the job-id filter, after the
/// correlator state has been updated. Lets the caller restore whatever
/// affordances it disabled while the job was pending.
pub type SettledCallback = Box<dyn FnMut() + Send>;

/// What the correlator did with an inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Correlation {
    /// The event was for another (or no longer tracked) job.
    Ignored,
    /// The event matched and was not a completion.
    Updated(JobStatus),
    /// The tracked job completed; the payload went to the render path.
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum CorrelatorError {
    #[error("Job {0} is still outstanding")]
    JobOutstanding(JobId),
}

/// Session-scoped tracker for the single outstanding job.
#[derive(Default)]
pub struct ResultCorrelator {
    current: Option<JobId>,
    on_settled: Option<SettledCallback>,
}

impl ResultCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The job currently being waited on, if any.
    pub fn current(&self) -> Option<&JobId> {
        self.current.as_ref()
    }

    pub fn is_tracking(&self) -> bool {
        self.current.is_some()
    }

    /// Start tracking `job_id`.
    ///
    /// Rejected while another job is outstanding; use [`supersede`]
    /// to abandon it explicitly.
    ///
    /// [`supersede`]: Self::supersede
    pub fn begin_tracking(
        &mut self,
        job_id: JobId,
        callback: SettledCallback,
    ) -> Result<(), CorrelatorError> {
        if let Some(existing) = &self.current {
            return Err(CorrelatorError::JobOutstanding(existing.clone()));
        }
        self.current = Some(job_id);
        self.on_settled = Some(callback);
        Ok(())
    }

    /// Track `job_id`, abandoning correlation for any job already tracked.
    ///
    /// Returns the abandoned job id. Late events for it are dropped.
    pub fn supersede(&mut self, job_id: JobId, callback: SettledCallback) -> Option<JobId> {
        let abandoned = self.current.replace(job_id);
        self.on_settled = Some(callback);
        if let Some(old) = &abandoned {
            tracing::info!(abandoned_job_id = %old, "Abandoned correlation for superseded job");
        }
        abandoned
    }

    /// Stop tracking without waiting for a terminal event.
    pub fn forget(&mut self) -> Option<JobId> {
        self.on_settled = None;
        self.current.take()
    }

    /// Feed one notification through the correlator.
    ///
    /// `render` receives the result payload of a matching `Completed`
    /// event. The settled callback runs afterwards for every matching
    /// event, terminal or not.
    pub fn on_event<R>(&mut self, event: &JobNotification, render: R) -> Correlation
    where
        R: FnOnce(&serde_json::Value),
    {
        let matches = self.current.as_ref() == Some(&event.job_id);
        if !matches {
            tracing::trace!(job_id = %event.job_id, "Ignoring notification for untracked job");
            return Correlation::Ignored;
        }

        let terminal = event.status.is_terminal();
        if terminal {
            self.current = None;
        }

        let outcome = if event.status == JobStatus::Completed {
            match &event.extra_info {
                Some(payload) => render(payload),
                None => {
                    tracing::warn!(job_id = %event.job_id, "Completed notification carried no result");
                }
            }
            Correlation::Completed
        } else {
            Correlation::Updated(event.status)
        };

        if terminal {
            if let Some(mut callback) = self.on_settled.take() {
                callback();
            }
        } else if let Some(callback) = self.on_settled.as_mut() {
            callback();
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, SettledCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: SettledCallback = Box::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    fn event(id: &str, status: JobStatus) -> JobNotification {
        let event = JobNotification::new(JobId::from(id), status);
        if status == JobStatus::Completed {
            event.with_extra_info(serde_json::json!({ "Window": 3 }))
        } else {
            event
        }
    }

    #[test]
    fn ignores_events_for_other_jobs() {
        let mut correlator = ResultCorrelator::new();
        let (calls, callback) = counter();
        correlator.begin_tracking(JobId::from("a"), callback).unwrap();

        let outcome = correlator.on_event(&event("b", JobStatus::Completed), |_| {
            panic!("must not render another job's result")
        });

        assert_eq!(outcome, Correlation::Ignored);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(correlator.is_tracking());
    }

    #[test]
    fn completed_renders_then_clears() {
        let mut correlator = ResultCorrelator::new();
        let (calls, callback) = counter();
        correlator.begin_tracking(JobId::from("a"), callback).unwrap();

        let mut rendered = None;
        let outcome = correlator.on_event(&event("a", JobStatus::Completed), |payload| {
            rendered = Some(payload.clone());
        });

        assert_eq!(outcome, Correlation::Completed);
        assert_eq!(rendered.unwrap()["Window"], 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!correlator.is_tracking());
    }

    #[test]
    fn callback_runs_for_non_terminal_matching_events() {
        let mut correlator = ResultCorrelator::new();
        let (calls, callback) = counter();
        correlator.begin_tracking(JobId::from("a"), callback).unwrap();

        let outcome = correlator.on_event(&event("a", JobStatus::Running), |_| {});

        assert_eq!(outcome, Correlation::Updated(JobStatus::Running));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(correlator.is_tracking());
    }

    #[test]
    fn acts_on_at_most_one_completed_event() {
        let mut correlator = ResultCorrelator::new();
        let (_calls, callback) = counter();
        correlator.begin_tracking(JobId::from("a"), callback).unwrap();

        let mut renders = 0;
        for _ in 0..3 {
            correlator.on_event(&event("a", JobStatus::Completed), |_| renders += 1);
        }

        assert_eq!(renders, 1);
    }

    #[test]
    fn nothing_after_failure() {
        let mut correlator = ResultCorrelator::new();
        let (calls, callback) = counter();
        correlator.begin_tracking(JobId::from("a"), callback).unwrap();

        assert_eq!(
            correlator.on_event(&event("a", JobStatus::Failed), |_| {}),
            Correlation::Updated(JobStatus::Failed)
        );
        assert_eq!(
            correlator.on_event(&event("a", JobStatus::Completed), |_| panic!("too late")),
            Correlation::Ignored
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_begin_tracking_is_rejected() {
        let mut correlator = ResultCorrelator::new();
        let (_, first) = counter();
        let (_, second) = counter();
        correlator.begin_tracking(JobId::from("a"), first).unwrap();

        let err = correlator.begin_tracking(JobId::from("b"), second).unwrap_err();

        assert_matches!(err, CorrelatorError::JobOutstanding(id) if id.as_str() == "a");
        assert_eq!(correlator.current().unwrap().as_str(), "a");
    }

    #[test]
    fn superseded_job_events_are_dropped() {
        let mut correlator = ResultCorrelator::new();
        let (_, first) = counter();
        let (calls, second) = counter();
        correlator.begin_tracking(JobId::from("a"), first).unwrap();

        let abandoned = correlator.supersede(JobId::from("b"), second);

        assert_eq!(abandoned.unwrap().as_str(), "a");
        assert_eq!(
            correlator.on_event(&event("a", JobStatus::Completed), |_| panic!("stale")),
            Correlation::Ignored
        );
        assert_eq!(
            correlator.on_event(&event("b", JobStatus::Completed), |_| {}),
            Correlation::Completed
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tracking_can_restart_after_terminal_event() {
        let mut correlator = ResultCorrelator::new();
        let (_, first) = counter();
        let (_, second) = counter();
        correlator.begin_tracking(JobId::from("a"), first).unwrap();
        correlator.on_event(&event("a", JobStatus::Cancelled), |_| {});

        assert!(correlator.begin_tracking(JobId::from("b"), second).is_ok());
    }
}
