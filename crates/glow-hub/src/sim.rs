//! Simulated radio for testing without hardware
//!
//! Records every configuration change and transmitted frame, and lets tests
//! inject frames to be "received" in listen mode. Clones share state, so a
//! test keeps a handle while the switchboard owns the driver.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use glow_protocol::Protocol;

use crate::switchboard::RadioDriver;

/// One recorded transmission
#[derive(Debug, Clone)]
pub struct SentFrame {
    /// Variant the transceiver was configured for at send time
    pub protocol: Option<Protocol>,
    /// The raw frame
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct SimInner {
    active: Option<Protocol>,
    configures: Vec<Protocol>,
    sent: Vec<SentFrame>,
    rx_queue: VecDeque<Vec<u8>>,
    fail_sends: bool,
}

/// A transceiver that records instead of radiating
#[derive(Clone, Default)]
pub struct SimulatedRadio {
    inner: Arc<Mutex<SimInner>>,
}

impl SimulatedRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame transmitted so far, oldest first
    pub fn sent_frames(&self) -> Vec<SentFrame> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Number of `configure` calls observed
    pub fn configure_count(&self) -> usize {
        self.inner.lock().unwrap().configures.len()
    }

    /// The full configuration history
    pub fn configure_history(&self) -> Vec<Protocol> {
        self.inner.lock().unwrap().configures.clone()
    }

    /// The variant the simulated hardware is currently set to
    pub fn active(&self) -> Option<Protocol> {
        self.inner.lock().unwrap().active
    }

    /// Queue a frame to be returned by the next `receive` poll
    pub fn inject_frame(&self, bytes: Vec<u8>) {
        self.inner.lock().unwrap().rx_queue.push_back(bytes);
    }

    /// Make every subsequent `send` fail with an I/O error
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.lock().unwrap().fail_sends = fail;
    }
}

impl RadioDriver for SimulatedRadio {
    fn configure(&mut self, protocol: Protocol) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.active = Some(protocol);
        inner.configures.push(protocol);
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_sends {
            return Err(io::Error::other("simulated radio failure"));
        }
        let protocol = inner.active;
        inner.sent.push(SentFrame {
            protocol,
            bytes: frame.to_vec(),
        });
        Ok(())
    }

    fn receive(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.inner.lock().unwrap().rx_queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_recording() {
        let radio = SimulatedRadio::new();
        let mut driver: Box<dyn RadioDriver> = Box::new(radio.clone());

        driver.configure(Protocol::Cct).unwrap();
        driver.send(&[0x01, 0x02]).unwrap();

        assert_eq!(radio.configure_count(), 1);
        let frames = radio.sent_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].protocol, Some(Protocol::Cct));
        assert_eq!(frames[0].bytes, vec![0x01, 0x02]);
    }

    #[test]
    fn injected_frames_come_back_in_order() {
        let radio = SimulatedRadio::new();
        let mut driver: Box<dyn RadioDriver> = Box::new(radio.clone());

        radio.inject_frame(vec![1]);
        radio.inject_frame(vec![2]);

        assert_eq!(driver.receive().unwrap(), Some(vec![1]));
        assert_eq!(driver.receive().unwrap(), Some(vec![2]));
        assert_eq!(driver.receive().unwrap(), None);
    }

    #[test]
    fn send_failures_are_switchable() {
        let radio = SimulatedRadio::new();
        let mut driver: Box<dyn RadioDriver> = Box::new(radio.clone());
        driver.configure(Protocol::Rgb).unwrap();

        radio.set_fail_sends(true);
        assert!(driver.send(&[0xFF]).is_err());

        radio.set_fail_sends(false);
        assert!(driver.send(&[0xFF]).is_ok());
        assert_eq!(radio.sent_frames().len(), 1);
    }
}
