//! Packet sender: best-effort reliable delivery without acknowledgments
//!
//! None of the lighting protocols ack anything, so delivery confidence comes
//! from redundancy: every logical command is transmitted several times with
//! a configured spacing. The sender owns a bounded FIFO of send jobs and
//! moves exactly one frame to the radio per tick; a job with repeats left is
//! re-queued at the tail, so distinct jobs stay in FIFO order while one
//! job's repeats remain ordered among themselves.
//!
//! The queue rejects new work when full. Dropping the *newest* command would
//! discard the most recent user intent in favor of a stale one, so the
//! policy is reject-new and let the caller decide.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use glow_protocol::{BulbId, Protocol};
use tracing::{debug, warn};

use crate::error::HubError;
use crate::switchboard::RadioSwitchboard;

/// Terminal outcome of a send job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// All repeats were transmitted
    Completed,
    /// The job was removed before its repeats were exhausted
    Aborted,
}

/// A queued command with its remaining redundancy budget
#[derive(Debug, Clone)]
struct SendJob {
    bulb: BulbId,
    protocol: Protocol,
    frame: Vec<u8>,
    remaining: u32,
    interval: Duration,
    next_due: Instant,
}

/// Completion record emitted when a job leaves the queue
#[derive(Debug, Clone)]
pub struct CompletedSend {
    /// Group the command addressed
    pub bulb: BulbId,
    /// Variant the frame was encoded for
    pub protocol: Protocol,
    /// The frame that was (repeatedly) transmitted
    pub frame: Vec<u8>,
    /// How the job ended
    pub outcome: SendOutcome,
}

/// Bounded repeat-transmission queue
pub struct PacketSender {
    queue: VecDeque<SendJob>,
    capacity: usize,
}

impl PacketSender {
    /// Create a sender with the given job capacity (clamped to at least 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Jobs currently queued
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Job slots still available
    ///
    /// Multi-packet commands pre-check this so they are accepted or
    /// rejected as a whole.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.queue.len()
    }

    /// Append a send job; the first transmission is due immediately
    ///
    /// `repeats` is clamped to at least 1. Fails with
    /// [`HubError::QueueFull`] without touching the queue.
    pub fn enqueue(
        &mut self,
        now: Instant,
        bulb: BulbId,
        protocol: Protocol,
        frame: Vec<u8>,
        repeats: u32,
        interval: Duration,
    ) -> Result<(), HubError> {
        if self.queue.len() >= self.capacity {
            return Err(HubError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.queue.push_back(SendJob {
            bulb,
            protocol,
            frame,
            remaining: repeats.max(1),
            interval,
            next_due: now,
        });
        Ok(())
    }

    /// Remove all queued jobs for a group, completing them as aborted
    pub fn abort_for(&mut self, bulb: &BulbId) -> Vec<CompletedSend> {
        let mut aborted = Vec::new();
        self.queue.retain(|job| {
            if job.bulb == *bulb {
                aborted.push(CompletedSend {
                    bulb: job.bulb,
                    protocol: job.protocol,
                    frame: job.frame.clone(),
                    outcome: SendOutcome::Aborted,
                });
                false
            } else {
                true
            }
        });
        aborted
    }

    /// Transmit at most one frame this tick
    ///
    /// The head job blocks the queue until its spacing deadline passes;
    /// that is what guarantees FIFO order between jobs. A `RadioBusy`
    /// transmit is retried next tick without consuming a repeat; a driver
    /// I/O failure consumes the repeat, since the attempt is all the
    /// ack-less medium ever offers.
    pub fn tick(&mut self, now: Instant, radio: &mut RadioSwitchboard) -> Option<CompletedSend> {
        match self.queue.front() {
            Some(job) if now >= job.next_due => {}
            _ => return None,
        }
        let mut job = self.queue.pop_front()?;

        match radio.transmit(now, job.protocol, &job.frame) {
            Ok(()) => {}
            Err(HubError::RadioBusy { remaining_ms }) => {
                debug!("radio busy ({}ms left), holding {}", remaining_ms, job.bulb);
                self.queue.push_front(job);
                return None;
            }
            Err(e) => {
                warn!("transmit failed for {}: {}", job.bulb, e);
            }
        }

        job.remaining -= 1;
        if job.remaining == 0 {
            debug!("send complete for {}", job.bulb);
            return Some(CompletedSend {
                bulb: job.bulb,
                protocol: job.protocol,
                frame: job.frame,
                outcome: SendOutcome::Completed,
            });
        }

        // Re-queue at the tail so other pending jobs interleave between
        // this job's repeats
        job.next_due = now + job.interval;
        self.queue.push_back(job);
        None
    }
}
