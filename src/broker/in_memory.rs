//! In-memory broker for testing and single-process scenarios.
//!
//! Implements the full [`BrokerClient`] surface without a network:
//!
//! - Point-to-point destinations are shared queues; consumers opened
//!   on the same destination compete for messages.
//! - Messages sharing a key are pinned to the consumer that first
//!   received that key, so per-key order survives competing consumers
//!   (JMSXGroupID-style message groups).
//! - Broadcast works by naming convention, the way ActiveMQ virtual
//!   topics do: a consumer queue named `group.{sub}.fanout.{chan}` is
//!   bound to sends on `fanout.{chan}` and receives its own copy.
//!   A fan-out send with no bound groups is dropped (topic semantics).
//! - `acknowledge` records delivery ids so tests can assert the
//!   ack-every-delivery invariant.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use super::{BrokerClient, BrokerError, ConsumerHandle, RawMessage};
use crate::channel::{Destination, FANOUT_PREFIX, GROUP_PREFIX};

struct Stored {
    delivery_id: u64,
    key: Option<String>,
    body: Vec<u8>,
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<Stored>,
    /// key -> consumer id that owns the message group
    key_owner: HashMap<String, u64>,
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, Queue>,
    /// fan-out destination -> bound consumer queue names
    bindings: HashMap<String, BTreeSet<String>>,
    /// open consumer id -> queue name
    consumers: HashMap<u64, String>,
    /// destinations configured to refuse `open_consumer`
    failing: HashSet<String>,
    acked: Vec<u64>,
    next_consumer_id: u64,
    next_delivery_id: u64,
}

struct Shared {
    state: Mutex<BrokerState>,
    wake: Condvar,
}

/// Thread-safe in-memory broker. `Clone` shares the broker.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use consumed_rust::{BrokerClient, Destination, InMemoryBroker};
///
/// let broker = InMemoryBroker::new();
/// let dest = Destination::raw("orders");
///
/// let consumer = broker.open_consumer(&dest).unwrap();
/// broker.send(&dest, None, b"payload").unwrap();
///
/// let raw = broker.receive(&consumer, Duration::from_millis(10)).unwrap().unwrap();
/// assert_eq!(raw.body, b"payload");
/// broker.acknowledge(&raw).unwrap();
/// ```
#[derive(Clone)]
pub struct InMemoryBroker {
    shared: Arc<Shared>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        InMemoryBroker {
            shared: Arc::new(Shared {
                state: Mutex::new(BrokerState::default()),
                wake: Condvar::new(),
            }),
        }
    }

    /// Make `open_consumer` fail for a destination (test hook for
    /// subscribe-time failure paths).
    pub fn fail_destination(&self, destination: impl Into<String>) {
        let mut state = self.shared.state.lock().unwrap();
        state.failing.insert(destination.into());
    }

    /// Delivery ids acknowledged so far, in ack order.
    pub fn acknowledged(&self) -> Vec<u64> {
        self.shared.state.lock().unwrap().acked.clone()
    }

    /// Number of acknowledgments recorded so far.
    pub fn ack_count(&self) -> usize {
        self.shared.state.lock().unwrap().acked.len()
    }

    /// Number of currently open consumers.
    pub fn open_consumer_count(&self) -> usize {
        self.shared.state.lock().unwrap().consumers.len()
    }

    /// Number of undelivered messages buffered on a destination.
    pub fn pending(&self, destination: &Destination) -> usize {
        let state = self.shared.state.lock().unwrap();
        state
            .queues
            .get(destination.as_str())
            .map_or(0, |q| q.pending.len())
    }

    /// Find the first pending message a consumer may take: unkeyed,
    /// keyed to this consumer, or keyed but unclaimed (claims it).
    fn claim_next(queue: &mut Queue, consumer_id: u64) -> Option<Stored> {
        let mut take_at = None;
        for (idx, stored) in queue.pending.iter().enumerate() {
            match &stored.key {
                None => {
                    take_at = Some(idx);
                    break;
                }
                Some(key) => match queue.key_owner.get(key) {
                    Some(owner) if *owner == consumer_id => {
                        take_at = Some(idx);
                        break;
                    }
                    Some(_) => continue,
                    None => {
                        queue.key_owner.insert(key.clone(), consumer_id);
                        take_at = Some(idx);
                        break;
                    }
                },
            }
        }
        take_at.and_then(|idx| queue.pending.remove(idx))
    }
}

impl BrokerClient for InMemoryBroker {
    fn open_consumer(&self, destination: &Destination) -> Result<ConsumerHandle, BrokerError> {
        let mut state = self.shared.state.lock().unwrap();
        let name = destination.as_str().to_string();

        if state.failing.contains(&name) {
            return Err(BrokerError::UnknownDestination(name));
        }

        state.next_consumer_id += 1;
        let id = state.next_consumer_id;
        state.queues.entry(name.clone()).or_default();
        state.consumers.insert(id, name.clone());

        // A `group.{sub}.fanout.{chan}` queue is bound to its fan-out
        // source so sends on `fanout.{chan}` are copied into it.
        if name.starts_with(GROUP_PREFIX) {
            if let Some(pos) = name.find(&format!(".{}", FANOUT_PREFIX)) {
                let source = name[pos + 1..].to_string();
                state.bindings.entry(source).or_default().insert(name);
            }
        }

        Ok(ConsumerHandle {
            id,
            destination: destination.clone(),
        })
    }

    fn receive(
        &self,
        handle: &ConsumerHandle,
        timeout: Duration,
    ) -> Result<Option<RawMessage>, BrokerError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock().unwrap();

        loop {
            let queue_name = match state.consumers.get(&handle.id) {
                Some(name) => name.clone(),
                None => return Err(BrokerError::ConsumerClosed(handle.id)),
            };

            if let Some(queue) = state.queues.get_mut(&queue_name) {
                if let Some(stored) = Self::claim_next(queue, handle.id) {
                    return Ok(Some(RawMessage {
                        delivery_id: stored.delivery_id,
                        destination: queue_name,
                        key: stored.key,
                        body: stored.body,
                    }));
                }
            }

            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) => remaining,
                None => return Ok(None),
            };
            let (guard, wait) = self.shared.wake.wait_timeout(state, remaining).unwrap();
            state = guard;
            if wait.timed_out() {
                return Ok(None);
            }
        }
    }

    fn acknowledge(&self, message: &RawMessage) -> Result<(), BrokerError> {
        let mut state = self.shared.state.lock().unwrap();
        state.acked.push(message.delivery_id);
        Ok(())
    }

    fn send(
        &self,
        destination: &Destination,
        key: Option<&str>,
        body: &[u8],
    ) -> Result<(), BrokerError> {
        let mut state = self.shared.state.lock().unwrap();
        let name = destination.as_str();

        let targets: Vec<String> = if name.starts_with(FANOUT_PREFIX) {
            state
                .bindings
                .get(name)
                .map(|bound| bound.iter().cloned().collect())
                .unwrap_or_default()
        } else {
            vec![name.to_string()]
        };

        for target in targets {
            state.next_delivery_id += 1;
            let stored = Stored {
                delivery_id: state.next_delivery_id,
                key: key.map(str::to_string),
                body: body.to_vec(),
            };
            state.queues.entry(target).or_default().pending.push_back(stored);
        }

        self.shared.wake.notify_all();
        Ok(())
    }

    fn close_consumer(&self, handle: &ConsumerHandle) -> Result<(), BrokerError> {
        let mut state = self.shared.state.lock().unwrap();
        let queue_name = state
            .consumers
            .remove(&handle.id)
            .ok_or(BrokerError::ConsumerClosed(handle.id))?;

        // Release this consumer's message groups so survivors can
        // claim the remaining keyed messages.
        if let Some(queue) = state.queues.get_mut(&queue_name) {
            queue.key_owner.retain(|_, owner| *owner != handle.id);
        }

        self.shared.wake.notify_all();
        Ok(())
    }
}
