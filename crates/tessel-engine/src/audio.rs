//! Sound playback requests.
//!
//! Systems cannot reach the host's mixer. They push [`SoundHandle`]s onto an
//! [`AudioQueue`] kept in shared state, and the host drains the queue into
//! its [`AudioSink`] once the frame is over.

use tessel_ecs::component::SoundHandle;

/// Something that can play a sound.
pub trait AudioSink {
    fn play(&mut self, sound: SoundHandle);
}

/// Sounds requested during a frame, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioQueue {
    pending: Vec<SoundHandle>,
}

impl AudioQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sound: SoundHandle) {
        self.pending.push(sound);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Play every pending sound on `sink`, leaving the queue empty.
    pub fn drain_into(&mut self, sink: &mut impl AudioSink) -> usize {
        let count = self.pending.len();
        for sound in self.pending.drain(..) {
            sink.play(sound);
        }
        count
    }
}

/// A sink that remembers what it was asked to play.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    pub played: Vec<SoundHandle>,
}

impl AudioSink for RecordingSink {
    fn play(&mut self, sound: SoundHandle) {
        self.played.push(sound);
    }
}
