//! Background jobs polled from the UI loop.
//!
//! A [`Task`] runs a future on the tokio runtime and hands its result back
//! through a channel. The UI calls [`Task::poll`] on every tick, so results
//! are applied on the UI loop and never race with rendering.
//!
//! # Example
//!
//! ```ignore
//! let source = source.clone();
//! let mut load = Task::spawn(async move { fetch_catalog(&source).await });
//!
//! // In the tick handler
//! if let Some(result) = load.poll() {
//!     controller.apply_load(result);
//! }
//! ```

use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use tokio::sync::oneshot;

/// A background job whose result is collected by polling.
pub struct Task<T> {
  receiver: Option<oneshot::Receiver<Result<T>>>,
}

impl<T> Default for Task<T> {
  fn default() -> Self {
    Self::idle()
  }
}

impl<T: Send + 'static> Task<T> {
  /// Start running `future` in the background.
  pub fn spawn<Fut>(future: Fut) -> Self
  where
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let mut task = Self::idle();
    task.restart(future);
    task
  }

  /// Replace any pending job with a new one. The old result is discarded.
  pub fn restart<Fut>(&mut self, future: Fut)
  where
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);

    tokio::spawn(async move {
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(future.await);
    });
  }
}

impl<T> Task<T> {
  /// A task with nothing running
  pub fn idle() -> Self {
    Self { receiver: None }
  }

  pub fn is_running(&self) -> bool {
    self.receiver.is_some()
  }

  /// Take the result if the job has finished.
  ///
  /// Returns `None` while running and when idle.
  pub fn poll(&mut self) -> Option<Result<T>> {
    let receiver = self.receiver.as_mut()?;

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => {
        // Sender dropped without sending - the job panicked
        self.receiver = None;
        Some(Err(eyre!("Background task was cancelled")))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test]
  async fn test_task_success() {
    let mut task = Task::spawn(async { Ok(vec![1, 2, 3]) });
    assert!(task.is_running());

    tokio::time::sleep(Duration::from_millis(10)).await;

    let result = task.poll().unwrap().unwrap();
    assert_eq!(result, vec![1, 2, 3]);
    assert!(!task.is_running());
    assert!(task.poll().is_none());
  }

  #[tokio::test]
  async fn test_task_error() {
    let mut task: Task<i32> = Task::spawn(async { Err(eyre!("Something went wrong")) });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = task.poll().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "Something went wrong");
  }

  #[tokio::test]
  async fn test_poll_while_running() {
    let mut task = Task::spawn(async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok(42)
    });
    assert!(task.poll().is_none());
    assert!(task.is_running());
  }

  #[test]
  fn test_idle_task() {
    let mut task: Task<()> = Task::idle();
    assert!(!task.is_running());
    assert!(task.poll().is_none());
  }

  #[tokio::test]
  async fn test_restart_discards_pending() {
    let counter = Arc::new(AtomicU32::new(0));

    let make = |counter: Arc<AtomicU32>| async move {
      tokio::time::sleep(Duration::from_millis(50)).await;
      Ok(counter.fetch_add(1, Ordering::SeqCst))
    };

    let mut task = Task::spawn(make(counter.clone()));
    tokio::time::sleep(Duration::from_millis(10)).await;

    task.restart(make(counter.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Both jobs ran, but only the second result is delivered
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(task.poll().unwrap().unwrap(), 1);
  }
}
