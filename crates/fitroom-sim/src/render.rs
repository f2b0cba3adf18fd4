//! Console transcript of a run.
//!
//! Reproduces the classic fitting-room output:
//!
//! ```text
//! ----- Blue Only -----
//!
//! Thread ID: 1
//! Color: Blue
//!
//! Thread 1 exits the fitting room.
//!
//! >> Empty Fitting Room
//! ```

use std::{
    fmt,
    io::{self, Write},
};

use fitroom_core::{Category, RoomObserver, WorkerId};
use parking_lot::Mutex;

/// Observer writing the run transcript to `W`.
///
/// Write failures are logged and otherwise ignored: rendering never aborts a
/// run.
#[derive(Debug)]
pub struct ConsoleRenderer<W> {
    out: Mutex<W>,
}

impl ConsoleRenderer<io::Stdout> {
    /// Renderer writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleRenderer<W> {
    /// Renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn block(&self, args: fmt::Arguments<'_>) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{args}\n").and_then(|()| out.flush()) {
            tracing::warn!("transcript write failed: {}", e);
        }
    }
}

impl<W: Write + Send> RoomObserver for ConsoleRenderer<W> {
    fn on_session_start(&self, category: Category) {
        self.block(format_args!("----- {category} Only -----"));
    }

    fn on_worker_admitted(&self, id: WorkerId, category: Category) {
        self.block(format_args!("Thread ID: {id}\nColor: {category}"));
    }

    fn on_worker_departed(&self, id: WorkerId, _category: Category) {
        self.block(format_args!("Thread {id} exits the fitting room."));
    }

    fn on_room_empty(&self) {
        self.block(format_args!(">> Empty Fitting Room"));
    }
}
