//! Radio switchboard: one physical transceiver, many logical radios
//!
//! The gateway has a single 2.4 GHz transceiver but speaks several mutually
//! incompatible frame formats. The switchboard owns the hardware and makes
//! it behave as one logical radio per variant: callers name a protocol, the
//! switchboard reconfigures the transceiver only when the variant actually
//! changes, and a settle window after each reconfiguration surfaces as a
//! retryable `RadioBusy` instead of a blocking wait.
//!
//! Listen mode shares the same antenna: the switchboard can sit in receive
//! mode for one variant (capturing third-party remote presses) until a
//! transmit or listen for a *different* variant supersedes it.

use std::io;
use std::time::{Duration, Instant};

use glow_protocol::Protocol;
use tracing::{debug, info, warn};

use crate::error::HubError;

/// Platform radio primitives consumed by the switchboard
///
/// Implementations wrap the actual transceiver driver; tests use
/// [`crate::sim::SimulatedRadio`]. All calls must return promptly: latency
/// is modeled by the switchboard's settle window, not by blocking here.
pub trait RadioDriver: Send {
    /// Apply the modulation/addressing configuration for a variant
    fn configure(&mut self, protocol: Protocol) -> io::Result<()>;

    /// Transmit one raw frame with the current configuration
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Poll for one received frame, `None` if nothing is pending
    fn receive(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Owner of the physical transceiver
pub struct RadioSwitchboard {
    driver: Box<dyn RadioDriver>,
    active: Option<Protocol>,
    listening: Option<Protocol>,
    settle: Duration,
    settle_until: Option<Instant>,
}

impl RadioSwitchboard {
    /// Take ownership of a driver
    pub fn new(driver: Box<dyn RadioDriver>, settle: Duration) -> Self {
        Self {
            driver,
            active: None,
            listening: None,
            settle,
            settle_until: None,
        }
    }

    /// The variant the transceiver is currently configured for
    pub fn active(&self) -> Option<Protocol> {
        self.active
    }

    /// The variant being listened for, if in receive mode
    pub fn listening(&self) -> Option<Protocol> {
        self.listening
    }

    /// Whether a reconfiguration settle window is still open
    pub fn is_settling(&self, now: Instant) -> bool {
        self.settle_until.is_some_and(|until| now < until)
    }

    /// Transmit one frame for a variant, reconfiguring first if needed
    ///
    /// Fails with [`HubError::RadioBusy`] while a settle window is open;
    /// the caller retries on a later tick rather than blocking. A transmit
    /// for a different variant ends any active listen.
    pub fn transmit(&mut self, now: Instant, protocol: Protocol, frame: &[u8]) -> Result<(), HubError> {
        if let Some(listened) = self.listening {
            if listened != protocol {
                info!(
                    "listen for {} superseded by transmit for {}",
                    listened.name(),
                    protocol.name()
                );
                self.listening = None;
            }
        }

        self.ensure_configured(now, protocol)?;
        self.driver.send(frame)?;
        debug!("transmitted {} bytes as {}", frame.len(), protocol.name());
        Ok(())
    }

    /// Enter receive mode for a variant
    ///
    /// Supersedes any previous listen. The variant switch pays the same
    /// settle window as a transmit; frames only start flowing once it
    /// closes.
    pub fn listen(&mut self, now: Instant, protocol: Protocol) -> Result<(), HubError> {
        match self.ensure_configured(now, protocol) {
            // Settling just delays the first frame; receive mode is
            // committed either way
            Ok(()) | Err(HubError::RadioBusy { .. }) => {}
            Err(e) => return Err(e),
        }
        if self.listening != Some(protocol) {
            info!("listening for {} frames", protocol.name());
        }
        self.listening = Some(protocol);
        Ok(())
    }

    /// Leave receive mode
    pub fn stop_listen(&mut self) {
        if let Some(protocol) = self.listening.take() {
            info!("stopped listening for {}", protocol.name());
        }
    }

    /// Poll for one frame while in receive mode
    pub fn poll_frame(&mut self, now: Instant) -> Option<Vec<u8>> {
        if self.listening.is_none() || self.is_settling(now) {
            return None;
        }
        match self.driver.receive() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("radio receive failed: {}", e);
                None
            }
        }
    }

    /// Reconfigure the transceiver if the variant changed
    ///
    /// Reconfiguration has a real latency cost on the hardware, so it only
    /// happens on an actual variant change. Starting one opens the settle
    /// window and fails the current call with `RadioBusy`.
    fn ensure_configured(&mut self, now: Instant, protocol: Protocol) -> Result<(), HubError> {
        if let Some(until) = self.settle_until {
            if now < until {
                return Err(HubError::RadioBusy {
                    remaining_ms: until.saturating_duration_since(now).as_millis() as u64,
                });
            }
            self.settle_until = None;
        }

        if self.active == Some(protocol) {
            return Ok(());
        }

        self.driver.configure(protocol)?;
        debug!(
            "reconfigured transceiver {} -> {}",
            self.active.map_or("idle", |p| p.name()),
            protocol.name()
        );
        self.active = Some(protocol);

        if self.settle.is_zero() {
            return Ok(());
        }
        self.settle_until = Some(now + self.settle);
        Err(HubError::RadioBusy {
            remaining_ms: self.settle.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedRadio;

    fn switchboard(settle_ms: u64) -> (RadioSwitchboard, SimulatedRadio) {
        let radio = SimulatedRadio::new();
        let board = RadioSwitchboard::new(
            Box::new(radio.clone()),
            Duration::from_millis(settle_ms),
        );
        (board, radio)
    }

    #[test]
    fn transmit_without_settle_is_immediate() {
        let (mut board, radio) = switchboard(0);
        let now = Instant::now();

        board.transmit(now, Protocol::Rgbw, &[1, 2, 3]).unwrap();
        assert_eq!(radio.sent_frames().len(), 1);
        assert_eq!(board.active(), Some(Protocol::Rgbw));
    }

    #[test]
    fn variant_change_pays_settle_then_succeeds() {
        let (mut board, radio) = switchboard(5);
        let t0 = Instant::now();

        // First transmit triggers configuration, so it is busy
        let err = board.transmit(t0, Protocol::Rgbw, &[1]).unwrap_err();
        assert!(matches!(err, HubError::RadioBusy { .. }));
        assert_eq!(radio.sent_frames().len(), 0);

        // Still settling
        assert!(board
            .transmit(t0 + Duration::from_millis(4), Protocol::Rgbw, &[1])
            .is_err());

        // Window closed: same variant, no reconfiguration, frame goes out
        board
            .transmit(t0 + Duration::from_millis(5), Protocol::Rgbw, &[1])
            .unwrap();
        assert_eq!(radio.sent_frames().len(), 1);
        assert_eq!(radio.configure_count(), 1);
    }

    #[test]
    fn same_variant_never_reconfigures() {
        let (mut board, radio) = switchboard(0);
        let now = Instant::now();

        for _ in 0..5 {
            board.transmit(now, Protocol::Cct, &[0xAA]).unwrap();
        }
        assert_eq!(radio.configure_count(), 1);

        board.transmit(now, Protocol::Rgb, &[0xBB]).unwrap();
        assert_eq!(radio.configure_count(), 2);
    }

    #[test]
    fn listen_is_superseded_by_other_variant_transmit() {
        let (mut board, radio) = switchboard(0);
        let now = Instant::now();

        board.listen(now, Protocol::Rgbw).unwrap();
        assert_eq!(board.listening(), Some(Protocol::Rgbw));

        // Same variant: listen survives
        board.transmit(now, Protocol::Rgbw, &[1]).unwrap();
        assert_eq!(board.listening(), Some(Protocol::Rgbw));

        // Different variant: listen ends
        board.transmit(now, Protocol::RgbCct, &[2]).unwrap();
        assert_eq!(board.listening(), None);
        assert_eq!(radio.configure_count(), 2);
    }

    #[test]
    fn poll_only_returns_frames_while_listening() {
        let (mut board, radio) = switchboard(0);
        let now = Instant::now();

        radio.inject_frame(vec![0xB4, 0, 1, 0, 0, 1, 0]);
        assert_eq!(board.poll_frame(now), None, "not in receive mode");

        board.listen(now, Protocol::Rgbw).unwrap();
        assert_eq!(board.poll_frame(now), Some(vec![0xB4, 0, 1, 0, 0, 1, 0]));
        assert_eq!(board.poll_frame(now), None);
    }

    #[test]
    fn poll_is_quiet_during_settle() {
        let (mut board, radio) = switchboard(10);
        let t0 = Instant::now();

        radio.inject_frame(vec![0x01]);
        board.listen(t0, Protocol::Rgbw).unwrap();
        assert_eq!(board.poll_frame(t0), None, "still settling");
        assert!(board.poll_frame(t0 + Duration::from_millis(10)).is_some());
    }
}
