//! Replay server
//!
//! Accepts one TCP consumer at a time and runs a fresh [`ReplaySession`]
//! for it. Nothing carries over between connections: every session gets new
//! ordering state, a new batch buffer and a new pacing anchor.
//!
//! The listener is non-blocking so the accept loop can observe the
//! [`ShutdownSignal`]. Accepted streams are switched back to blocking; a
//! second consumer waits in the listen backlog until the current one leaves.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crate::filter::InclusionFilter;
use crate::observability::{Event, Logger};
use crate::ordering::{DecisionSink, OrderingConfig};
use crate::pacer::{BatchLimits, BatchingPacer, Pacing, SystemClock};
use crate::replay::{ReplayResult, ReplaySession};
use crate::shutdown::ShutdownSignal;
use crate::source::RecordSource;

/// Accept-loop poll interval while idle.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Pipeline settings shared by every session.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub ordering: OrderingConfig,
    pub filter: Option<InclusionFilter>,
    pub batch: BatchLimits,
    pub pacing: Pacing,
    pub looping: bool,
}

/// Single-consumer TCP replay server.
pub struct ReplayServer {
    listener: TcpListener,
    source: RecordSource,
    settings: SessionSettings,
    shutdown: ShutdownSignal,
}

impl ReplayServer {
    /// Binds `host:port`. Port 0 picks a free port.
    pub fn bind(
        host: &str,
        port: u16,
        source: RecordSource,
        settings: SessionSettings,
        shutdown: ShutdownSignal,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind((host, port))?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            source,
            settings,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn source(&self) -> &RecordSource {
        &self.source
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Serves consumers until shutdown is requested.
    ///
    /// Returns `Err` only for fatal source errors. A consumer leaving, or a
    /// failed write, ends that session and the loop accepts the next one.
    pub fn serve(&self, sink: &mut dyn DecisionSink) -> ReplayResult<()> {
        let addr = self
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();
        let source = self.source.path().display().to_string();
        Logger::event(
            Event::ServerListening,
            &[("addr", &addr), ("source", &source)],
        );

        while !self.shutdown.is_requested() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.handle(stream, peer, sink)?,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    let error = e.to_string();
                    Logger::event(Event::AcceptFailed, &[("error", &error)]);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        Logger::event(Event::ShutdownComplete, &[("addr", &addr)]);
        Ok(())
    }

    fn handle(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        sink: &mut dyn DecisionSink,
    ) -> ReplayResult<()> {
        let peer = peer.to_string();

        if let Err(e) = stream.set_nonblocking(false) {
            let error = e.to_string();
            Logger::event(Event::SessionFailed, &[("peer", &peer), ("error", &error)]);
            return Ok(());
        }
        let _ = stream.set_nodelay(true);

        let output = BatchingPacer::new(self.settings.batch, self.settings.pacing, SystemClock);
        let mut session = ReplaySession::new(
            &self.source,
            self.settings.filter.as_ref(),
            self.settings.ordering.clone(),
            output,
            self.settings.looping,
        )
        .with_shutdown(self.shutdown.clone());
        let session_id = session.id().to_string();

        Logger::event(
            Event::ClientConnected,
            &[("peer", &peer), ("session", &session_id)],
        );

        let mut writer = &stream;
        let result = session.run(&mut writer, sink);
        let _ = stream.shutdown(Shutdown::Both);

        match result {
            Ok(report) => {
                let passes = report.passes.to_string();
                let forwarded = report.totals.forwarded.to_string();
                Logger::event(
                    Event::ClientDisconnected,
                    &[
                        ("peer", &peer),
                        ("session", &session_id),
                        ("outcome", report.outcome.as_str()),
                        ("passes", &passes),
                        ("forwarded", &forwarded),
                    ],
                );
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                log_session_failed(&peer, &session_id, e.code(), &e.message());
                Err(e)
            }
            Err(e) => {
                log_session_failed(&peer, &session_id, e.code(), &e.message());
                Ok(())
            }
        }
    }
}

fn log_session_failed(peer: &str, session: &str, code: &str, message: &str) {
    Logger::event(
        Event::SessionFailed,
        &[
            ("peer", peer),
            ("session", session),
            ("code", code),
            ("error", message),
        ],
    );
}
