//! Live multi-row status display, repainted at a fixed interval.
//!
//! Producers send row updates through [`RowUpdater`]s. A single background
//! task owns the row buffer: on every tick it drains the queued updates,
//! keeping only the latest text of each row, and repaints the whole frame.

pub mod surface;

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::MissedTickBehavior,
};

pub use surface::{Surface, TerminalSurface};

#[derive(Debug, Clone)]
pub struct BoardOptions {
    /// Queue capacity per row. Producers wait when the queue is full.
    pub queue_per_row: usize,
    pub interval: Duration,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            queue_per_row: 10,
            interval: Duration::from_millis(100),
        }
    }
}

pub(crate) const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
struct RowUpdate {
    row: usize,
    text: String,
}

/// Handle of the repaint loop.
#[derive(Debug)]
pub struct StatusBoard {
    tx: mpsc::Sender<RowUpdate>,
    quit: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Cloneable producer side of a [`StatusBoard`].
#[derive(Debug, Clone)]
pub struct RowUpdater {
    tx: mpsc::Sender<RowUpdate>,
}

impl StatusBoard {
    /// Starts the repaint loop on the current tokio runtime.
    pub fn start<S>(rows: usize, opts: BoardOptions, surface: S) -> Self
    where
        S: Surface + Send + 'static,
    {
        let capacity = rows.saturating_mul(opts.queue_per_row).max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (quit, quit_rx) = oneshot::channel();

        let painter = Painter {
            rows: vec![String::new(); rows],
            surface,
            broken: false,
        };
        let handle = tokio::spawn(painter.run(rx, quit_rx, opts.interval));

        Self { tx, quit, handle }
    }

    pub fn updater(&self) -> RowUpdater {
        RowUpdater {
            tx: self.tx.clone(),
        }
    }

    pub async fn update(&self, row: usize, text: impl Into<String>) {
        send(&self.tx, row, text.into()).await
    }

    /// Drains pending updates, paints the final frame, and waits for the
    /// repaint loop to end.
    pub async fn stop(self) {
        let Self { tx, quit, handle } = self;
        drop(tx);
        let _ = quit.send(());
        handle
            .await
            .unwrap_or_else(|e| log::error!("Status display task failed: {}", e));
    }
}

impl RowUpdater {
    /// Enqueues `text` as the new content of `row`. Waits if the queue is full.
    pub async fn update(&self, row: usize, text: impl Into<String>) {
        send(&self.tx, row, text.into()).await
    }
}

async fn send(tx: &mpsc::Sender<RowUpdate>, row: usize, text: String) {
    if tx.send(RowUpdate { row, text }).await.is_err() {
        log::debug!("Status display is gone; dropped update of row {}", row);
    }
}

struct Painter<S> {
    rows: Vec<String>,
    surface: S,
    broken: bool,
}

impl<S: Surface> Painter<S> {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<RowUpdate>,
        mut quit: oneshot::Receiver<()>,
        interval: Duration,
    ) {
        let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Updates sent right before `stop()` are still queued, so the
            // queue is drained once more after quit is requested.
            let end = tokio::select! {
                _ = &mut quit => true,
                _ = ticker.tick() => false,
            };

            while let Ok(up) = rx.try_recv() {
                self.apply(up);
            }

            if end {
                break;
            }
            if !self.broken {
                let res = self.surface.draw(&self.rows);
                self.check(res);
            }
        }

        if !self.broken {
            let res = self.surface.finish(&self.rows);
            self.check(res);
        }
    }

    fn apply(&mut self, up: RowUpdate) {
        match self.rows.get_mut(up.row) {
            Some(row) => *row = up.text,
            None => log::warn!(
                "Ignored update of row {} (only {} rows)",
                up.row,
                self.rows.len()
            ),
        }
    }

    /// The first failure disables all further painting.
    fn check(&mut self, res: std::io::Result<()>) {
        if let Err(e) = res {
            log::warn!("Failed to paint status display: {}", e);
            self.broken = true;
        }
    }
}
