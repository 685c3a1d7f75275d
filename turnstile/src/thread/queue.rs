use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::thread::error::QueueError;

/// A thread-safe FIFO queue shared between actor threads.
///
/// The station uses two of these: the admission queue (actor ids waiting for
/// their turn) and, inside [`ResourcePool`](crate::thread::pool::ResourcePool),
/// the idle resource handles.
///
/// # Thread Safety
/// - Every operation runs inside a single critical section
/// - Every mutation wakes all blocked waiters, which then re-check their condition
/// - A poisoned lock is recovered; no operation leaves the queue half-updated
///
/// # Capacity
/// The queue itself is unbounded; only the waits on it are bounded.
pub struct BoundedFifoQueue<T> {
    /// Items and the push counter, behind one lock
    state: Mutex<QueueState<T>>,

    /// Signalled on every push, pop and explicit wake-up
    changed: Condvar,
}

struct QueueState<T> {
    items: VecDeque<T>,
    /// Number of pushes so far; the ticket of the next push
    pushed: u64,
}

impl<T> fmt::Debug for BoundedFifoQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("BoundedFifoQueue")
            .field("len", &state.items.len())
            .field("pushed", &state.pushed)
            .finish()
    }
}

impl<T> Default for BoundedFifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BoundedFifoQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue with room for `capacity` items before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                pushed: 0,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item to the back of the queue.
    ///
    /// Always succeeds. The item is visible to every observer once this
    /// returns.
    ///
    /// # Returns
    /// The item's ticket: the number of pushes that happened before it.
    /// Tickets are assigned inside the critical section, so they order pushes
    /// exactly.
    pub fn push(&self, item: T) -> u64 {
        self.push_with(item, || ())
    }

    /// Like [`push`](Self::push), running `on_push` inside the same critical
    /// section as the push.
    pub fn push_with<F>(&self, item: T, on_push: F) -> u64
    where
        F: FnOnce(),
    {
        let ticket = {
            let mut state = self.lock();
            let ticket = state.pushed;
            state.pushed += 1;
            state.items.push_back(item);
            on_push();
            ticket
        };
        self.changed.notify_all();
        ticket
    }

    /// Removes and returns the front item, blocking until there is one.
    pub fn pop_front(&self) -> T {
        self.pop_front_with(|_| ())
    }

    /// Like [`pop_front`](Self::pop_front), running `on_pop` on the item
    /// inside the same critical section as the pop.
    pub fn pop_front_with<F>(&self, on_pop: F) -> T
    where
        F: FnOnce(&T),
    {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                on_pop(&item);
                drop(state);
                self.changed.notify_all();
                return item;
            }
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes and returns the front item, waiting at most `timeout` for one.
    ///
    /// # Returns
    /// * `Ok(item)` - The front item
    /// * `Err(QueueError::Timeout)` - Nothing arrived in time
    pub fn pop_front_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.changed.notify_all();
                return Ok(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(QueueError::Timeout(timeout));
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Removes and returns the front item if there is one.
    pub fn try_pop_front(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() {
            self.changed.notify_all();
        }
        item
    }

    /// Blocks until `ready` accepts the current front of the queue.
    ///
    /// `ready` runs under the queue lock: once when called, then again after
    /// every push, pop and [`wake_all`](Self::wake_all). It must be cheap and
    /// must not touch this queue. Conditions that depend on state outside the
    /// queue are only re-checked if whoever changes that state calls
    /// `wake_all` afterwards.
    pub fn wait_front_until<F>(&self, mut ready: F)
    where
        F: FnMut(Option<&T>) -> bool,
    {
        let mut state = self.lock();
        while !ready(state.items.front()) {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wakes every blocked waiter so it re-checks its condition.
    pub fn wake_all(&self) {
        // Taking the lock orders this wake-up after any condition check in flight.
        let _state = self.lock();
        self.changed.notify_all();
    }

    /// Removes every item, front first.
    pub fn drain(&self) -> Vec<T> {
        let items: Vec<T> = self.lock().items.drain(..).collect();
        self.changed.notify_all();
        items
    }

    /// Gets the number of items currently in the queue.
    ///
    /// This is a snapshot and may change by the time the value is used.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Runs `read` on the current length while holding the queue lock.
    ///
    /// State that only changes inside [`push_with`](Self::push_with) or
    /// [`pop_front_with`](Self::pop_front_with) hooks reads consistently with
    /// the length here.
    pub fn len_with<R, F>(&self, read: F) -> R
    where
        F: FnOnce(usize) -> R,
    {
        read(self.lock().items.len())
    }

    /// Checks if the queue is empty.
    ///
    /// This is a snapshot and may change by the time the value is used; it is
    /// a polling hint, never a guarantee that a following pop will not block.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Total number of pushes since the queue was created.
    pub fn pushed(&self) -> u64 {
        self.lock().pushed
    }
}

impl<T: Clone> BoundedFifoQueue<T> {
    /// Returns a copy of the front item without removing it.
    ///
    /// The answer is only true at the instant of the call; callers must
    /// re-check after any later blocking operation.
    ///
    /// # Returns
    /// * `Ok(item)` - A copy of the front item
    /// * `Err(QueueError::Empty)` - The queue had no items
    pub fn peek_front(&self) -> Result<T, QueueError> {
        self.lock().items.front().cloned().ok_or(QueueError::Empty)
    }

    /// Copies every item, front first.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_push_pop_preserves_order() {
        let queue = BoundedFifoQueue::new();
        for i in 0..5 {
            queue.push(i);
        }

        let popped: Vec<i32> = (0..5).map(|_| queue.pop_front()).collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_returns_sequential_tickets() {
        let queue = BoundedFifoQueue::new();
        assert_eq!(queue.push('a'), 0);
        assert_eq!(queue.push('b'), 1);
        queue.pop_front();
        assert_eq!(queue.push('c'), 2);
        assert_eq!(queue.pushed(), 3);
    }

    #[test]
    fn test_peek_does_not_remove() {
        let queue = BoundedFifoQueue::new();
        assert_eq!(queue.peek_front(), Err(QueueError::Empty));

        queue.push(7);
        queue.push(8);
        assert_eq!(queue.peek_front(), Ok(7));
        assert_eq!(queue.peek_front(), Ok(7));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_pop_timeout_on_empty_queue() {
        let queue: BoundedFifoQueue<u8> = BoundedFifoQueue::new();
        let result = queue.pop_front_timeout(Duration::from_millis(20));
        assert_eq!(result, Err(QueueError::Timeout(Duration::from_millis(20))));
    }

    #[test]
    fn test_blocking_pop_wakes_on_push() {
        let queue = Arc::new(BoundedFifoQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_front())
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(42);
        assert_eq!(consumer.join().unwrap(), 42);
    }

    #[test]
    fn test_wait_front_until_sees_later_front() {
        let queue = Arc::new(BoundedFifoQueue::new());
        queue.push(1);
        queue.push(2);

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_front_until(|front| front == Some(&2)))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        assert_eq!(queue.pop_front(), 1);
        waiter.join().unwrap();
        assert_eq!(queue.snapshot(), vec![2]);
    }

    #[test]
    fn test_drain_empties_in_order() {
        let queue = BoundedFifoQueue::with_capacity(4);
        queue.push("x");
        queue.push("y");
        assert_eq!(queue.drain(), vec!["x", "y"]);
        assert_eq!(queue.try_pop_front(), None);
    }
}
