//! Incremental tail engine.
//!
//! A session watches one file and, for every settled burst of change
//! notifications, reads the bytes appended since the previous tick and hands
//! each complete non-blank line to a caller-supplied handler. Ticks run one at
//! a time on a dedicated worker thread.

pub mod debounce;
pub mod delta;
pub mod lines;
pub mod notifier;
pub mod offset;
pub mod target;

use std::{
    sync::mpsc::{channel, Receiver, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, info, warn};

use crate::error::{Result, TailError};

pub use debounce::{Debouncer, Signal, Tick, DEFAULT_QUIET_WINDOW};
pub use delta::{DeltaReader, TextChunk};
pub use lines::LineBuffer;
pub use notifier::ChangeNotifier;
pub use offset::{OffsetPair, OffsetTracker};
pub use target::WatchTarget;

#[derive(Debug, Clone)]
pub struct TailConfig {
    /// How long the file must stay quiet before a burst of changes is read.
    pub quiet_window: Duration,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            quiet_window: DEFAULT_QUIET_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Watching,
    Stopped,
}

enum Session {
    Idle,
    Watching {
        notifier: ChangeNotifier,
        control: Sender<Signal>,
        worker: JoinHandle<()>,
    },
    Stopped,
}

/// One tail session over a [`WatchTarget`].
///
/// Lines already in the file when [`subscribe`](Self::subscribe) is called
/// are not reported. Errors while processing a tick are logged and the tick is
/// skipped; only setup can fail. Dropping the pipeline disposes it.
pub struct TailPipeline {
    target: WatchTarget,
    config: TailConfig,
    session: Session,
}

impl TailPipeline {
    pub fn new(target: WatchTarget, config: TailConfig) -> Self {
        Self {
            target,
            config,
            session: Session::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        match self.session {
            Session::Idle => PipelineState::Idle,
            Session::Watching { .. } => PipelineState::Watching,
            Session::Stopped => PipelineState::Stopped,
        }
    }

    /// Starts watching. `handler` runs on the worker thread, once per line, in
    /// file order; a slow handler delays the following ticks.
    pub fn subscribe<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(&str) + Send + 'static,
    {
        match self.session {
            Session::Idle => (),
            Session::Watching { .. } => return Err(TailError::InvalidState("watching")),
            Session::Stopped => return Err(TailError::InvalidState("stopped")),
        }

        // Watch before seeding so every write after the seed raises a signal.
        let (control, signals) = channel();
        let notifier = ChangeNotifier::watch(&self.target, control.clone())?;

        let tracker = OffsetTracker::seed(self.target.path())?;
        let start_offset = tracker.last_length();

        let worker = TailWorker::new(self.target.clone(), tracker, handler);
        let debouncer = Debouncer::new(self.config.quiet_window);
        let worker = thread::Builder::new()
            .name("colortail-worker".to_string())
            .spawn(move || worker.run(&debouncer, &signals))
            .map_err(TailError::Spawn)?;

        info!(path = ?self.target.path(), start_offset, "watching");
        self.session = Session::Watching {
            notifier,
            control,
            worker,
        };
        Ok(())
    }

    /// Stops the session. A tick already in progress finishes and may still
    /// deliver lines; this returns once it has. Safe to call more than once.
    pub fn dispose(&mut self) {
        match std::mem::replace(&mut self.session, Session::Stopped) {
            Session::Watching {
                notifier,
                control,
                worker,
            } => {
                drop(notifier);
                // fails only if the worker already exited
                let _ = control.send(Signal::Shutdown);
                if worker.join().is_err() {
                    warn!(path = ?self.target.path(), "tail worker panicked");
                }
                info!(path = ?self.target.path(), "stopped");
            }
            Session::Idle | Session::Stopped => (),
        }
    }
}

impl Drop for TailPipeline {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Per-session state owned by the worker thread.
struct TailWorker<F> {
    target: WatchTarget,
    tracker: OffsetTracker,
    reader: DeltaReader,
    lines: LineBuffer,
    handler: F,
}

impl<F: FnMut(&str)> TailWorker<F> {
    fn new(target: WatchTarget, tracker: OffsetTracker, handler: F) -> Self {
        Self {
            target,
            tracker,
            reader: DeltaReader,
            lines: LineBuffer::new(),
            handler,
        }
    }

    fn run(mut self, debouncer: &Debouncer, signals: &Receiver<Signal>) {
        while debouncer.next_tick(signals) == Tick::Changed {
            self.tick();
        }

        if let Some(line) = self.lines.flush() {
            (self.handler)(line.as_str());
        }
    }

    fn tick(&mut self) {
        if let Err(e) = self.try_tick() {
            warn!(
                error = &e as &dyn std::error::Error,
                "skipped tick, no lines delivered"
            );
        }
    }

    /// Returns the number of lines delivered.
    fn try_tick(&mut self) -> Result<usize> {
        let path = self.target.path();
        let pair = self.tracker.observe(path)?;
        debug!(previous = pair.previous, current = pair.current, "tick");

        if pair.is_shrink() {
            warn!(
                path = ?path,
                previous = pair.previous,
                current = pair.current,
                "file shrank; continuing from its new end"
            );
            self.lines.clear();
        }

        let chunk = self.reader.read_between(path, pair).map_err(|e| {
            if e.is_transient() {
                // retry the same region next tick
                self.tracker.rewind(pair);
            }
            e
        })?;

        if chunk.end() < pair.current {
            // a character was cut mid-write; finish it next tick
            self.tracker.hold_back(chunk.end());
        }

        let lines = self.lines.push(chunk.as_str());
        for line in &lines {
            (self.handler)(line.as_str());
        }
        Ok(lines.len())
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::OpenOptions, io::Write, path::Path};

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        target: WatchTarget,
    }

    impl Fixture {
        fn new(initial: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let target = WatchTarget::new(dir.path().join("app.log")).unwrap();
            std::fs::write(target.path(), initial).unwrap();
            Self { _dir: dir, target }
        }

        fn path(&self) -> &Path {
            self.target.path()
        }

        fn append(&self, bytes: &[u8]) {
            let mut file = OpenOptions::new().append(true).open(self.path()).unwrap();
            file.write_all(bytes).unwrap();
        }

        fn worker(&self) -> (TailWorker<impl FnMut(&str)>, Receiver<String>) {
            let (tx, rx) = channel();
            let tracker = OffsetTracker::seed(self.path()).unwrap();
            let worker = TailWorker::new(self.target.clone(), tracker, move |line: &str| {
                tx.send(line.to_owned()).unwrap();
            });
            (worker, rx)
        }
    }

    #[test]
    fn appended_lines_are_delivered_in_order() {
        let fixture = Fixture::new("");
        let (mut worker, lines) = fixture.worker();

        fixture.append(b"hello\n[error] boom\n");
        assert_eq!(worker.try_tick().unwrap(), 2);

        assert_eq!(lines.try_iter().collect::<Vec<_>>(), ["hello", "[error] boom"]);
    }

    #[test]
    fn existing_content_is_not_reported() {
        let fixture = Fixture::new("old line\n");
        let (mut worker, lines) = fixture.worker();

        fixture.append(b"new line\n");
        worker.tick();

        assert_eq!(lines.try_iter().collect::<Vec<_>>(), ["new line"]);
    }

    #[test]
    fn unchanged_file_delivers_nothing() {
        let fixture = Fixture::new("x\n");
        let (mut worker, lines) = fixture.worker();

        assert_eq!(worker.try_tick().unwrap(), 0);
        assert_eq!(lines.try_iter().count(), 0);
    }

    #[test]
    fn blank_appends_deliver_nothing() {
        let fixture = Fixture::new("");
        let (mut worker, lines) = fixture.worker();

        fixture.append(b"   \n\n");
        assert_eq!(worker.try_tick().unwrap(), 0);
        assert_eq!(lines.try_iter().count(), 0);
    }

    #[test]
    fn consecutive_ticks_chain_offsets() {
        let fixture = Fixture::new("");
        let (mut worker, _lines) = fixture.worker();

        fixture.append(b"one\n");
        worker.tick();
        let after_first = worker.tracker.last_length();

        fixture.append(b"two\n");
        let pair = worker.tracker.observe(fixture.path()).unwrap();
        assert_eq!(pair.previous, after_first);
    }

    #[test]
    fn line_written_across_ticks_comes_out_whole() {
        let fixture = Fixture::new("");
        let (mut worker, lines) = fixture.worker();

        fixture.append(b"par");
        worker.tick();
        fixture.append(b"tial\n");
        worker.tick();

        assert_eq!(lines.try_iter().collect::<Vec<_>>(), ["partial"]);
    }

    #[test]
    fn truncation_does_not_stop_the_session() {
        let fixture = Fixture::new("a fairly long first line\n");
        let (mut worker, lines) = fixture.worker();

        std::fs::write(fixture.path(), "short\n").unwrap();
        worker.tick();
        fixture.append(b"after\n");
        worker.tick();

        assert_eq!(lines.try_iter().last().as_deref(), Some("after"));
    }

    #[test]
    fn vanished_file_skips_tick_and_keeps_baseline() {
        let fixture = Fixture::new("keep\n");
        let (mut worker, lines) = fixture.worker();

        std::fs::remove_file(fixture.path()).unwrap();
        assert!(worker.try_tick().unwrap_err().is_transient());
        worker.tick();
        assert_eq!(worker.tracker.last_length(), 5);
        assert_eq!(lines.try_iter().count(), 0);
    }

    #[test]
    fn undecodable_region_is_skipped() {
        let fixture = Fixture::new("");
        let (mut worker, lines) = fixture.worker();

        fixture.append(b"\xff\xfe\n");
        assert!(matches!(worker.try_tick(), Err(TailError::Decode { .. })));

        fixture.append(b"readable\n");
        worker.tick();
        assert_eq!(lines.try_iter().collect::<Vec<_>>(), ["readable"]);
    }

    #[test]
    fn character_split_across_ticks_is_reassembled() {
        let fixture = Fixture::new("");
        let (mut worker, lines) = fixture.worker();

        fixture.append(b"caf\xc3");
        assert_eq!(worker.try_tick().unwrap(), 0);
        assert_eq!(worker.tracker.last_length(), 3);

        fixture.append(b"\xa9\nnext\n");
        assert_eq!(worker.try_tick().unwrap(), 2);

        assert_eq!(lines.try_iter().collect::<Vec<_>>(), ["café", "next"]);
    }

    #[test]
    fn run_processes_ticks_until_shutdown_and_flushes_fragment() {
        let fixture = Fixture::new("");
        let (worker, lines) = fixture.worker();
        let (control, signals) = channel();

        fixture.append(b"first\nno newline");
        control.send(Signal::Changed).unwrap();
        control.send(Signal::Changed).unwrap();

        let debouncer = Debouncer::new(Duration::from_millis(10));
        let handle = thread::spawn(move || worker.run(&debouncer, &signals));
        thread::sleep(Duration::from_millis(200));
        control.send(Signal::Shutdown).unwrap();
        handle.join().unwrap();

        assert_eq!(
            lines.try_iter().collect::<Vec<_>>(),
            ["first", "no newline"]
        );
    }

    #[test]
    fn pipeline_lifecycle() {
        let fixture = Fixture::new("");
        let mut pipeline = TailPipeline::new(fixture.target.clone(), TailConfig::default());
        assert_eq!(pipeline.state(), PipelineState::Idle);

        pipeline.subscribe(|_| ()).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Watching);
        assert!(matches!(
            pipeline.subscribe(|_| ()),
            Err(TailError::InvalidState("watching"))
        ));

        pipeline.dispose();
        pipeline.dispose();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(pipeline.subscribe(|_| ()).is_err());
    }

    #[test]
    fn missing_directory_fails_notifier_setup() {
        let dir = tempfile::tempdir().unwrap();
        let target = WatchTarget::new(dir.path().join("absent").join("app.log")).unwrap();
        let mut pipeline = TailPipeline::new(target, TailConfig::default());

        assert!(matches!(
            pipeline.subscribe(|_| ()),
            Err(TailError::NotifierSetup { .. })
        ));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn missing_file_fails_subscribe() {
        let dir = tempfile::tempdir().unwrap();
        let target = WatchTarget::new(dir.path().join("absent.log")).unwrap();
        let mut pipeline = TailPipeline::new(target, TailConfig::default());

        assert!(matches!(
            pipeline.subscribe(|_| ()),
            Err(TailError::Inaccessible { .. })
        ));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }
}
