//! Test reveal collaborators — recording `AudioCue` and `RevealView`
//! implementations.

use std::sync::Mutex;

use zerohour_core::choice::Choice;
use zerohour_reveal::audio::AudioCue;
use zerohour_reveal::renderer::RevealView;

/// An audio cue that records `"start"` and `"stop"` in call order.
#[derive(Debug, Default)]
pub struct RecordingAudioCue {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingAudioCue {
    /// Returns the recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl AudioCue for RecordingAudioCue {
    fn start_loop(&self) {
        self.calls.lock().unwrap().push("start");
    }

    fn stop(&self) {
        self.calls.lock().unwrap().push("stop");
    }
}

/// A view that records every draw call.
#[derive(Debug, Default)]
pub struct RecordingRevealView {
    texts: Mutex<Vec<(usize, String)>>,
    choices: Mutex<Vec<(usize, Vec<Choice>)>>,
    scrolls: Mutex<usize>,
}

impl RecordingRevealView {
    /// Returns every `(index, visible text)` drawn, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn texts(&self) -> Vec<(usize, String)> {
        self.texts.lock().unwrap().clone()
    }

    /// Returns every `(index, choices)` shown, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn choices(&self) -> Vec<(usize, Vec<Choice>)> {
        self.choices.lock().unwrap().clone()
    }

    /// Returns the number of scroll-to-bottom calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn scrolls(&self) -> usize {
        *self.scrolls.lock().unwrap()
    }
}

impl RevealView for RecordingRevealView {
    fn show_text(&self, index: usize, visible: &str) {
        self.texts
            .lock()
            .unwrap()
            .push((index, visible.to_owned()));
    }

    fn scroll_to_bottom(&self) {
        *self.scrolls.lock().unwrap() += 1;
    }

    fn show_choices(&self, index: usize, choices: &[Choice]) {
        self.choices
            .lock()
            .unwrap()
            .push((index, choices.to_vec()));
    }
}
