use crate::virtual_machine::errors::Fault;
use crate::virtual_machine::vm::lane::LaneId;
use std::collections::{BTreeMap, VecDeque};

#[derive(Clone, Debug)]
struct Lock {
    holder: LaneId,
    waiters: VecDeque<LaneId>,
}

/// Result of a LOCK attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Acquire {
    Granted,
    Queued,
}

/// Lock keys to holders and FIFO wait queues.
#[derive(Clone, Debug, Default)]
pub struct LockTable {
    locks: BTreeMap<u8, Lock>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `key` to `lane` if it is free or already held by `lane`;
    /// otherwise queues `lane` behind the current waiters.
    pub fn acquire(&mut self, key: u8, lane: LaneId) -> Acquire {
        match self.locks.get_mut(&key) {
            None => {
                self.locks.insert(
                    key,
                    Lock {
                        holder: lane,
                        waiters: VecDeque::new(),
                    },
                );
                Acquire::Granted
            }
            Some(lock) if lock.holder == lane => Acquire::Granted,
            Some(lock) => {
                if !lock.waiters.contains(&lane) {
                    lock.waiters.push_back(lane);
                }
                Acquire::Queued
            }
        }
    }

    /// Releases `key` held by `lane` and hands it to the first waiter, which is returned.
    pub fn release(&mut self, key: u8, lane: LaneId) -> Result<Option<LaneId>, Fault> {
        match self.locks.get_mut(&key) {
            Some(lock) if lock.holder == lane => match lock.waiters.pop_front() {
                Some(next) => {
                    lock.holder = next;
                    Ok(Some(next))
                }
                None => {
                    self.locks.remove(&key);
                    Ok(None)
                }
            },
            _ => Err(Fault::LockNotHeld { lock: key }),
        }
    }

    /// Releases every lock held by `lane` and drops it from every queue.
    /// Returns the lanes that were handed a lock, in key order.
    pub fn release_all(&mut self, lane: LaneId) -> Vec<LaneId> {
        for lock in self.locks.values_mut() {
            lock.waiters.retain(|waiter| *waiter != lane);
        }
        let held: Vec<u8> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.holder == lane)
            .map(|(key, _)| *key)
            .collect();
        held.into_iter()
            .filter_map(|key| self.release(key, lane).ok().flatten())
            .collect()
    }

    pub fn holder(&self, key: u8) -> Option<LaneId> {
        self.locks.get(&key).map(|lock| lock.holder)
    }

    /// Lanes waiting on `key`, in hand-off order.
    pub fn waiters(&self, key: u8) -> impl Iterator<Item = &LaneId> {
        self.locks.get(&key).into_iter().flat_map(|lock| lock.waiters.iter())
    }

    pub fn clear(&mut self) {
        self.locks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
