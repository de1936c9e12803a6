//! Queued Teams webhook handler.
//!
//! `TeamsQueueHandler` decouples logging from delivery: `emit` pushes the
//! record onto an unbounded FIFO queue and returns immediately, while a
//! single consumer thread owns the wrapped [`TeamsHandler`] and drives
//! formatting and HTTP delivery serially, preserving emission order. The
//! queue never applies backpressure, so it may grow without limit while the
//! webhook is slower than the producers.

use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, unbounded};
use parking_lot::Mutex;

use crate::handler::TeamsHandler;
use crate::level::Level;
use crate::log_record::LogRecord;

/// Timeout used when the `log` facade asks for a flush.
const FACADE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Grace period granted to the consumer when the handler is dropped
/// without an explicit `close`.
const DROP_GRACE: Duration = Duration::from_secs(1);

/// Commands processed by the consumer thread.
#[derive(Debug)]
enum Command {
    Record(LogRecord),
    Flush(Sender<()>),
    Shutdown(Sender<()>),
}

/// Non-blocking handler wrapping a [`TeamsHandler`] behind a queue.
///
/// Created with [`TeamsQueueHandler::start`], which spawns the consumer
/// thread; dropped records only ever occur after [`TeamsQueueHandler::close`]
/// or at process exit. Implements [`log::Log`] like the synchronous handler.
pub struct TeamsQueueHandler {
    url: String,
    level: Level,
    tx: Option<Sender<Command>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TeamsQueueHandler {
    /// Spawn the consumer thread and hand it `inner`.
    ///
    /// This is the explicit start of the handler's lifecycle; constructing a
    /// [`TeamsHandler`] alone never creates a thread.
    pub fn start(inner: TeamsHandler) -> Self {
        let url = inner.url().to_string();
        let level = inner.level();
        let (tx, rx) = unbounded();
        let handle = thread::spawn(move || consumer_loop(inner, rx));
        Self {
            url,
            level,
            tx: Some(tx),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Webhook URL the wrapped handler posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Minimum level forwarded to the webhook.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Enqueue `record` for background delivery and return immediately.
    ///
    /// After [`TeamsQueueHandler::close`] the record is dropped with a
    /// stderr diagnostic.
    pub fn emit(&self, record: LogRecord) {
        let Some(tx) = self.tx.as_ref() else {
            eprintln!("teams-logger: queue handler is closed, dropping record");
            return;
        };
        if tx.send(Command::Record(record)).is_err() {
            eprintln!("teams-logger: consumer thread is gone, dropping record");
        }
    }

    /// Wait until everything enqueued before this call has been delivered.
    ///
    /// Returns `false` when the handler is closed or the acknowledgement
    /// does not arrive within `timeout`.
    pub fn flush(&self, timeout: Duration) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        let deadline = Instant::now() + timeout;
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send_timeout(Command::Flush(ack_tx), timeout).is_err() {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        ack_rx.recv_timeout(remaining).is_ok()
    }

    /// Number of commands still waiting in the queue.
    pub fn pending(&self) -> usize {
        self.tx.as_ref().map_or(0, Sender::len)
    }

    /// Stop the consumer after it has delivered everything still queued.
    ///
    /// Blocks without a deadline: close is the graceful path, and draining
    /// takes as long as the webhook takes. Subsequent emits are dropped.
    pub fn close(&mut self) {
        self.request_shutdown();
        self.join_consumer();
    }

    fn request_shutdown(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(Command::Shutdown(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.recv();
    }

    fn join_consumer(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            eprintln!("teams-logger: consumer thread panicked");
        }
    }

    /// Install this handler as the global `log` sink.
    ///
    /// The global maximum level is set from the handler's own level. The
    /// installed handler lives for the rest of the process, so records
    /// queued at exit may be lost; call [`TeamsQueueHandler::flush`] before
    /// shutdown when delivery matters.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let filter = self.level.to_level_filter();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(filter);
        Ok(())
    }
}

fn consumer_loop(handler: TeamsHandler, rx: Receiver<Command>) {
    loop {
        match rx.recv() {
            Ok(Command::Record(record)) => handler.emit(&record),
            Ok(Command::Flush(ack)) => {
                // Processing is serial, so reaching this command means every
                // record enqueued before it has been delivered.
                let _ = ack.send(());
            }
            Ok(Command::Shutdown(ack)) => {
                drain_pending(&handler, &rx);
                let _ = ack.send(());
                break;
            }
            Err(_) => {
                drain_pending(&handler, &rx);
                break;
            }
        }
    }
}

fn drain_pending(handler: &TeamsHandler, rx: &Receiver<Command>) {
    loop {
        match rx.try_recv() {
            Ok(Command::Record(record)) => handler.emit(&record),
            Ok(Command::Flush(ack) | Command::Shutdown(ack)) => {
                let _ = ack.send(());
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
}

impl log::Log for TeamsQueueHandler {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        Level::from(metadata.level()) >= self.level
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.emit(LogRecord::from_log(record));
        }
    }

    fn flush(&self) {
        let _ = self.flush(FACADE_FLUSH_TIMEOUT);
    }
}

impl Drop for TeamsQueueHandler {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            self.join_consumer();
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(Command::Shutdown(ack_tx)).is_ok()
            && ack_rx.recv_timeout(DROP_GRACE).is_err()
        {
            // Detach rather than hang shutdown; undelivered records are lost.
            eprintln!("teams-logger: consumer did not drain in time, detaching");
            return;
        }
        self.join_consumer();
    }
}

impl fmt::Debug for TeamsQueueHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamsQueueHandler")
            .field("url", &self.url)
            .field("level", &self.level)
            .field("pending", &self.pending())
            .finish()
    }
}
