//! Two-phase Boggle rounds on the board.
//!
//! A round sends the start grid right away and, once that send succeeds,
//! schedules the end grid on a tokio timer. The caller gets control back as
//! soon as the start grid is on the board; the end grid goes out in a
//! background task that nobody waits on.
//!
//! ```text
//!   start_round ──send start──▶ Pending ──sleep(round)──send end──▶ Completed
//!        │
//!        └── start send fails: error returned, nothing scheduled
//! ```

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::boggle::{BoardSize, BoggleGrids};
use crate::error::Error;
use crate::vestaboard::DisplaySender;

/// Where a round is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Start grid shown, end grid not yet sent
    Pending,
    /// End grid send attempted (successfully or not)
    Completed,
}

/// A round whose end grid is scheduled.
///
/// Dropping this detaches the background task; the end grid is still sent.
#[derive(Debug)]
pub struct ScheduledRound {
    size: BoardSize,
    ends_at: Instant,
    end_send: JoinHandle<Result<(), Error>>,
}

impl ScheduledRound {
    /// Board size of the round.
    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Earliest time the end grid will be sent.
    pub fn ends_at(&self) -> Instant {
        self.ends_at
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RoundState {
        if self.end_send.is_finished() {
            RoundState::Completed
        } else {
            RoundState::Pending
        }
    }

    /// Wait for the end grid send and return its outcome.
    ///
    /// A failure here has already been logged by the background task.
    pub async fn finished(self) -> Result<(), Error> {
        match self.end_send.await {
            Ok(result) => result,
            Err(join_err) => Err(Error::Request(format!(
                "end grid task did not complete: {join_err}"
            ))),
        }
    }
}

/// Show the start grid and schedule the end grid `round` later.
///
/// Returns once the start grid has been accepted by the board. If that
/// send fails the error is returned and no end grid is scheduled. A failed
/// end grid send is logged and otherwise dropped; there is no retry.
///
/// Must be called from within a tokio runtime.
pub async fn start_round<S>(
    sender: &S,
    grids: BoggleGrids,
    round: Duration,
) -> Result<ScheduledRound, Error>
where
    S: DisplaySender + Clone + 'static,
{
    let BoggleGrids { size, start, end } = grids;

    sender.send_array(&start).await?;
    tracing::info!("Boggle {} start grid sent", size);

    let ends_at = Instant::now() + round;
    let sender = sender.clone();
    let end_send = tokio::spawn(async move {
        tokio::time::sleep_until(ends_at).await;
        tracing::info!("Boggle {} timer finished, sending end grid", size);

        match sender.send_array(&end).await {
            Ok(()) => {
                tracing::info!("Boggle {} end grid sent", size);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error sending Boggle {} end grid: {}", size, e);
                Err(e)
            }
        }
    });

    Ok(ScheduledRound {
        size,
        ends_at,
        end_send,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording display double shared by the scheduler and API tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use crate::error::Error;
    use crate::vestaboard::DisplaySender;
    use crate::Characters;

    /// Log sink for asserting on emitted events.
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        /// Route this thread's events here until the guard drops.
        pub fn install(&self) -> tracing::subscriber::DefaultGuard {
            let subscriber = tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// What the fake board was asked to show.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Sent {
        Array(Characters),
        Text(String),
    }

    #[derive(Default)]
    struct Inner {
        sent: Vec<(Instant, Sent)>,
        failures: VecDeque<Option<Error>>,
    }

    /// Display sender that records every call and can be scripted to fail.
    #[derive(Clone, Default)]
    pub struct RecordingBoard {
        inner: Arc<Mutex<Inner>>,
    }

    impl RecordingBoard {
        /// Script the outcome of upcoming calls, in order. `None` succeeds.
        pub fn script(&self, outcomes: Vec<Option<Error>>) {
            self.inner.lock().unwrap().failures.extend(outcomes);
        }

        pub fn sent(&self) -> Vec<(Instant, Sent)> {
            self.inner.lock().unwrap().sent.clone()
        }

        pub fn arrays(&self) -> Vec<Characters> {
            self.sent()
                .into_iter()
                .filter_map(|(_, s)| match s {
                    Sent::Array(grid) => Some(grid),
                    Sent::Text(_) => None,
                })
                .collect()
        }

        fn record(&self, item: Sent) -> Result<(), Error> {
            let mut inner = self.inner.lock().unwrap();
            inner.sent.push((Instant::now(), item));
            match inner.failures.pop_front().flatten() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    impl DisplaySender for RecordingBoard {
        async fn send_array(&self, characters: &Characters) -> Result<(), Error> {
            self.record(Sent::Array(*characters))
        }

        async fn send_message(&self, text: &str) -> Result<(), Error> {
            self.record(Sent::Text(text.to_string()))
        }
    }
}
