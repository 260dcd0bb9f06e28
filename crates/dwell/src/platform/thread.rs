/*!
Thread-backed timers for native hosts.

A [`Platform`](super::Platform) implementation that has no event loop of its
own can delegate `schedule`/`cancel` here. One worker thread owns a deadline
queue and sleeps until the earliest entry is due; scheduling or canceling wakes
it to re-check. Canceling drops the task immediately.
*/

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::TimerTask;
use crate::types::TimerId;

#[derive(Default)]
struct TimerQueue {
  /// Due tasks ordered by deadline, then by id.
  tasks: BTreeMap<(Instant, TimerId), TimerTask>,
  due_by_id: HashMap<TimerId, Instant>,
  worker_running: bool,
  shutdown: bool,
}

#[derive(Default)]
struct Inner {
  queue: Mutex<TimerQueue>,
  wake: Condvar,
}

/// Cancelable one-shot timers served by a single background thread.
///
/// The worker starts with the first scheduled timer. Dropping the timers
/// cancels everything still pending and lets the worker exit.
#[derive(Default)]
pub struct ThreadTimers {
  inner: Arc<Inner>,
}

impl std::fmt::Debug for ThreadTimers {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ThreadTimers")
      .field("pending", &self.pending())
      .finish_non_exhaustive()
  }
}

impl ThreadTimers {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run `task` on the worker thread once `delay` has passed.
  pub fn schedule(&self, timer: TimerId, delay: Duration, task: TimerTask) {
    let due = Instant::now() + delay;
    let mut queue = self.inner.queue.lock();
    queue.tasks.insert((due, timer), task);
    queue.due_by_id.insert(timer, due);

    if !queue.worker_running {
      let inner = Arc::clone(&self.inner);
      let spawned = thread::Builder::new()
        .name("dwell-timers".to_string())
        .spawn(move || run_worker(&inner));
      match spawned {
        Ok(_) => queue.worker_running = true,
        Err(e) => {
          log::error!("Failed to spawn timer thread, dropping timer {timer}: {e}");
          queue.due_by_id.remove(&timer);
          let task = queue.tasks.remove(&(due, timer));
          drop(queue);
          drop(task);
          return;
        }
      }
    }
    drop(queue);
    self.inner.wake.notify_one();
  }

  /// Cancel a pending timer. Unknown or already fired timers are ignored.
  pub fn cancel(&self, timer: TimerId) {
    let task = {
      let mut queue = self.inner.queue.lock();
      let Some(due) = queue.due_by_id.remove(&timer) else {
        return;
      };
      queue.tasks.remove(&(due, timer))
    };
    self.inner.wake.notify_one();
    drop(task);
  }

  pub fn pending(&self) -> usize {
    self.inner.queue.lock().tasks.len()
  }
}

impl Drop for ThreadTimers {
  fn drop(&mut self) {
    let dropped = {
      let mut queue = self.inner.queue.lock();
      queue.shutdown = true;
      queue.due_by_id.clear();
      std::mem::take(&mut queue.tasks)
    };
    self.inner.wake.notify_all();
    drop(dropped);
  }
}

/// Fire due tasks in deadline order until shut down.
///
/// Tasks run without the queue lock held, so they may schedule or cancel.
fn run_worker(inner: &Inner) {
  let mut queue = inner.queue.lock();
  loop {
    if queue.shutdown {
      return;
    }
    match queue.tasks.first_key_value().map(|(&key, _)| key) {
      Some((due, timer)) if due <= Instant::now() => {
        queue.due_by_id.remove(&timer);
        if let Some(task) = queue.tasks.remove(&(due, timer)) {
          MutexGuard::unlocked(&mut queue, task);
        }
      }
      Some((due, _)) => {
        inner.wake.wait_until(&mut queue, due);
      }
      None => inner.wake.wait(&mut queue),
    }
  }
}
