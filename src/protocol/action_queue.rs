// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimum spacing between write requests.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes writes to one Bond with a minimum interval between them.
///
/// Requests run one at a time in submission order. Each request starts at
/// least `interval` after the previous one finished. Nothing is merged or
/// dropped: two writes to the same device are both sent.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use bond_bridge::protocol::ActionQueue;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = ActionQueue::new(Duration::from_millis(10));
/// let first = queue.run(async { 1 }).await;
/// let second = queue.run(async { 2 }).await;
/// assert_eq!(first + second, 3);
/// # }
/// ```
#[derive(Debug)]
pub struct ActionQueue {
    interval: Duration,
    // Holds the finish time of the last dispatch. Tokio's mutex grants the
    // lock in FIFO order.
    last: Mutex<Option<Instant>>,
}

impl ActionQueue {
    /// Creates a queue with the given minimum interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Returns the minimum interval between dispatches.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the queue slot, then runs `dispatch`.
    pub async fn run<F, T>(&self, dispatch: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last = self.last.lock().await;
        if let Some(finished) = *last {
            tokio::time::sleep_until(finished + self.interval).await;
        }

        let output = dispatch.await;
        *last = Some(Instant::now());
        output
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex as SyncMutex;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_consecutive_dispatches() {
        let queue = Arc::new(ActionQueue::new(Duration::from_millis(200)));
        let starts = Arc::new(SyncMutex::new(Vec::new()));
        let begin = Instant::now();

        let mut handles = Vec::new();
        for i in 0..3 {
            let queue = Arc::clone(&queue);
            let starts = Arc::clone(&starts);
            handles.push(tokio::spawn(async move {
                queue
                    .run(async {
                        starts.lock().push((i, begin.elapsed()));
                    })
                    .await;
            }));
            // Let each task reach the queue before spawning the next
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let starts = starts.lock().clone();
        let order: Vec<_> = starts.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(starts[0].1, Duration::ZERO);
        assert!(starts[1].1 >= Duration::from_millis(200));
        assert!(starts[2].1 >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn first_dispatch_is_immediate() {
        let queue = ActionQueue::new(Duration::from_secs(5));
        let begin = Instant::now();
        queue.run(async {}).await;
        assert!(begin.elapsed() < Duration::from_secs(5));
    }
}
