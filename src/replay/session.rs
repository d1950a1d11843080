//! Per-connection replay pipeline
//!
//! source → inclusion filter → ordering & repair → batching pacer → writer
//!
//! A session owns all mutable pipeline state (ordering state, batch buffer,
//! pacing anchor); nothing survives into the next connection. Each pass
//! starts with fresh ordering state. The pacing anchor is set once per
//! session so looping does not cause a burst.

use std::io::Write;

use uuid::Uuid;

use crate::filter::{self, InclusionFilter};
use crate::observability::{Event, Logger};
use crate::ordering::{DecisionEvent, DecisionKind, DecisionSink, OrderingConfig, OrderingEngine, OrderingState};
use crate::pacer::{BatchingPacer, Clock};
use crate::shutdown::ShutdownSignal;
use crate::source::RecordSource;

use super::errors::{is_peer_gone, ReplayError, ReplayResult};
use super::stats::PassStats;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Source exhausted (non-looping), or a looping pass forwarded nothing.
    Completed,
    /// Consumer disconnected mid-stream.
    PeerGone,
    /// Operator interrupt.
    Interrupted,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Completed => "completed",
            SessionOutcome::PeerGone => "peer_gone",
            SessionOutcome::Interrupted => "interrupted",
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub outcome: SessionOutcome,
    /// Passes started, including one cut short.
    pub passes: u64,
    /// Counters of the last pass, complete or not.
    pub last_pass: PassStats,
    /// Counters summed over all passes.
    pub totals: PassStats,
}

enum PassEnd {
    Exhausted,
    Stopped(SessionOutcome),
}

/// One connection's replay.
pub struct ReplaySession<'a, C> {
    id: Uuid,
    source: &'a RecordSource,
    filter: Option<&'a InclusionFilter>,
    engine: OrderingEngine,
    output: BatchingPacer<C>,
    looping: bool,
    shutdown: Option<ShutdownSignal>,
}

impl<'a, C: Clock> ReplaySession<'a, C> {
    /// Creates a session with fresh ordering state.
    pub fn new(
        source: &'a RecordSource,
        filter: Option<&'a InclusionFilter>,
        ordering: OrderingConfig,
        output: BatchingPacer<C>,
        looping: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            filter,
            engine: OrderingEngine::new(ordering, OrderingState::new()),
            output,
            looping,
            shutdown: None,
        }
    }

    /// Stops the session between records once `signal` is requested.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drives passes into `writer` until the source is exhausted (not
    /// looping), the consumer disconnects or shutdown is requested.
    ///
    /// A disconnect is reported as [`SessionOutcome::PeerGone`], not as an
    /// error. Source failures and other write failures are errors.
    pub fn run<W: Write>(
        &mut self,
        writer: &mut W,
        sink: &mut dyn DecisionSink,
    ) -> ReplayResult<SessionReport> {
        let session = self.id.to_string();
        sink.begin_session(&session);
        self.output.start();

        let mut report = SessionReport {
            session_id: self.id,
            outcome: SessionOutcome::Completed,
            passes: 0,
            last_pass: PassStats::default(),
            totals: PassStats::default(),
        };

        loop {
            if self.shutdown_requested() {
                report.outcome = SessionOutcome::Interrupted;
                break;
            }

            report.passes += 1;
            let pass_no = report.passes.to_string();
            Logger::event(Event::PassBegin, &[("session", &session), ("pass", &pass_no)]);

            let mut stats = PassStats::default();
            let end = self.run_pass(report.passes, writer, sink, &mut stats);

            report.last_pass = stats;
            report.totals.merge(&stats);

            let mut fields: Vec<(&str, String)> = stats.fields();
            fields.push(("session", session.clone()));
            fields.push(("pass", pass_no));
            let field_refs: Vec<(&str, &str)> =
                fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
            Logger::event(Event::PassComplete, &field_refs);

            match end? {
                PassEnd::Stopped(outcome) => {
                    report.outcome = outcome;
                    break;
                }
                PassEnd::Exhausted if !self.looping => break,
                PassEnd::Exhausted if stats.forwarded == 0 => {
                    Logger::event(Event::PassEmpty, &[("session", &session)]);
                    break;
                }
                PassEnd::Exhausted => {}
            }
        }

        Ok(report)
    }

    fn run_pass<W: Write>(
        &mut self,
        pass_no: u64,
        writer: &mut W,
        sink: &mut dyn DecisionSink,
        stats: &mut PassStats,
    ) -> ReplayResult<PassEnd> {
        let pass = self.source.pass()?;
        self.engine.reset();
        sink.begin_pass(pass_no);

        for item in pass {
            let mut record = item?;

            if self.shutdown_requested() {
                return Ok(PassEnd::Stopped(SessionOutcome::Interrupted));
            }

            stats.total += 1;

            if !filter::passes(self.filter, &record) {
                stats.filtered += 1;
                let value = self
                    .filter
                    .and_then(|f| record.field(f.column()))
                    .map(|v| v.into_owned())
                    .unwrap_or_default();
                sink.emit(DecisionEvent::new(DecisionKind::Filtered, record.line_no(), value));
                continue;
            }

            let decision = self.engine.process(&mut record, sink);
            stats.record_decision(&decision);
            if !decision.is_forwarded() {
                continue;
            }

            match self.output.push(&record, writer) {
                Ok(Some(batch)) => stats.record_batch(batch),
                Ok(None) => {}
                Err(e) if is_peer_gone(&e) => return Ok(PassEnd::Stopped(SessionOutcome::PeerGone)),
                Err(e) => return Err(ReplayError::Transport(e)),
            }
        }

        match self.output.flush(writer) {
            Ok(Some(batch)) => stats.record_batch(batch),
            Ok(None) => {}
            Err(e) if is_peer_gone(&e) => return Ok(PassEnd::Stopped(SessionOutcome::PeerGone)),
            Err(e) => return Err(ReplayError::Transport(e)),
        }

        Ok(PassEnd::Exhausted)
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().map_or(false, ShutdownSignal::is_requested)
    }
}
