//! The typing audio cue.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// Playback controls for the looping typing sound.
pub trait AudioCue: Send + Sync {
    /// Starts looped playback.
    fn start_loop(&self);

    /// Stops playback.
    fn stop(&self);
}

/// A cue that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn start_loop(&self) {}

    fn stop(&self) {}
}

/// Singleton access to the audio cue.
///
/// The intro reveal and every narrative reveal share one cue; a reveal must
/// hold the lease for as long as the cue plays.
#[derive(Clone)]
pub struct AudioChannel {
    cue: Arc<dyn AudioCue>,
    held: Arc<AtomicBool>,
}

impl AudioChannel {
    /// Creates a channel around `cue`.
    pub fn new(cue: Arc<dyn AudioCue>) -> Self {
        Self {
            cue,
            held: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the cue and returns the lease, or `None` if another reveal
    /// holds it.
    #[must_use]
    pub fn try_acquire(&self) -> Option<AudioLease> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        debug!("audio cue started");
        self.cue.start_loop();
        Some(AudioLease {
            cue: Arc::clone(&self.cue),
            held: Arc::clone(&self.held),
        })
    }

    /// Returns `true` while a lease is outstanding.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl fmt::Debug for AudioChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioChannel")
            .field("held", &self.is_held())
            .finish_non_exhaustive()
    }
}

/// Exclusive hold on the playing cue. Dropping it stops playback.
pub struct AudioLease {
    cue: Arc<dyn AudioCue>,
    held: Arc<AtomicBool>,
}

impl Drop for AudioLease {
    fn drop(&mut self) {
        self.cue.stop();
        self.held.store(false, Ordering::Release);
        debug!("audio cue stopped");
    }
}

impl fmt::Debug for AudioLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioLease").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records start/stop calls in order.
    #[derive(Debug, Default)]
    pub(crate) struct CueLog(pub Mutex<Vec<&'static str>>);

    impl AudioCue for CueLog {
        fn start_loop(&self) {
            self.0.lock().unwrap().push("start");
        }

        fn stop(&self) {
            self.0.lock().unwrap().push("stop");
        }
    }

    #[test]
    fn test_lease_is_exclusive_until_dropped() {
        // Arrange
        let cue = Arc::new(CueLog::default());
        let channel = AudioChannel::new(cue.clone());

        // Act
        let lease = channel.try_acquire();
        let second = channel.try_acquire();

        // Assert
        assert!(lease.is_some());
        assert!(second.is_none());
        assert!(channel.is_held());

        drop(lease);
        assert!(!channel.is_held());
        assert!(channel.try_acquire().is_some());
        assert_eq!(
            *cue.0.lock().unwrap(),
            vec!["start", "stop", "start", "stop"]
        );
    }
}
