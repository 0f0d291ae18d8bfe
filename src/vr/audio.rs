//! Locomotion-driven audio: a sink trait the coordinator drives from
//! boost/speed state, plus the sample set named in spec §4.1 step 7.

/// Named audio samples the coordinator expects a sink to recognize.
pub mod samples {
    /// Base thruster loop, level follows movement speed.
    pub const DPV: &str = "dpv";
    /// Secondary thruster layer, level follows boost.
    pub const DPV_HIGH: &str = "dpvhigh";
    /// Ambient underwater loop for the duration of a session.
    pub const VR_AMBIENCE: &str = "vrambience";
}

/// Destination for locomotion-driven audio cues. A real implementation
/// drives `web_sys::AudioContext` gain nodes; tests can use a recording
/// stub to assert on the sequence of calls.
pub trait AudioSink {
    /// Begin looping `sample`, if not already playing.
    fn start(&mut self, sample: &str);
    /// Stop `sample` if currently playing.
    fn stop(&mut self, sample: &str);
    /// Set `sample`'s gain in `[0, 1]` (no-op if not playing).
    fn set_level(&mut self, sample: &str, level: f32);
}

/// Sink that discards every cue. Used by the desktop preview binary and
/// by tests that don't care about audio, mirroring [`super::xr_backend::NullXrBackend`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn start(&mut self, _sample: &str) {}
    fn stop(&mut self, _sample: &str) {}
    fn set_level(&mut self, _sample: &str, _level: f32) {}
}

/// Drives an [`AudioSink`] from locomotion state: ambience plays
/// whenever a session is presenting, the base thruster loop plays while
/// moving with level following speed, and a second "high" layer fades
/// in under boost.
#[derive(Default)]
pub struct LocomotionAudio {
    ambience_on: bool,
    thruster_on: bool,
}

impl LocomotionAudio {
    /// Create a tracker with nothing playing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or stop session ambience (and, on session end, every
    /// thruster layer) in response to a presentation-state change.
    pub fn set_presenting(&mut self, presenting: bool, sink: &mut dyn AudioSink) {
        if presenting && !self.ambience_on {
            sink.start(samples::VR_AMBIENCE);
            self.ambience_on = true;
        } else if !presenting && self.ambience_on {
            sink.stop(samples::VR_AMBIENCE);
            sink.stop(samples::DPV);
            sink.stop(samples::DPV_HIGH);
            self.ambience_on = false;
            self.thruster_on = false;
        }
    }

    /// Update the thruster layers from this tick's locomotion speed
    /// (normalized `[0, 1]`) and boost (normalized `[0, 1]`).
    pub fn update(&mut self, speed_fraction: f32, boost_fraction: f32, sink: &mut dyn AudioSink) {
        let moving = speed_fraction > 0.0;
        if moving && !self.thruster_on {
            sink.start(samples::DPV);
            sink.start(samples::DPV_HIGH);
            self.thruster_on = true;
        } else if !moving && self.thruster_on {
            sink.stop(samples::DPV);
            sink.stop(samples::DPV_HIGH);
            self.thruster_on = false;
        }

        if self.thruster_on {
            sink.set_level(samples::DPV, speed_fraction.clamp(0.0, 1.0));
            sink.set_level(samples::DPV_HIGH, boost_fraction.clamp(0.0, 1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        started: Vec<String>,
        stopped: Vec<String>,
        levels: Vec<(String, f32)>,
    }

    impl AudioSink for RecordingSink {
        fn start(&mut self, sample: &str) {
            self.started.push(sample.to_string());
        }
        fn stop(&mut self, sample: &str) {
            self.stopped.push(sample.to_string());
        }
        fn set_level(&mut self, sample: &str, level: f32) {
            self.levels.push((sample.to_string(), level));
        }
    }

    #[test]
    fn presenting_starts_ambience_once() {
        let mut audio = LocomotionAudio::new();
        let mut sink = RecordingSink::default();
        audio.set_presenting(true, &mut sink);
        audio.set_presenting(true, &mut sink);
        assert_eq!(sink.started, vec![samples::VR_AMBIENCE.to_string()]);
    }

    #[test]
    fn ending_session_stops_all_layers() {
        let mut audio = LocomotionAudio::new();
        let mut sink = RecordingSink::default();
        audio.set_presenting(true, &mut sink);
        audio.update(0.5, 0.0, &mut sink);
        audio.set_presenting(false, &mut sink);
        assert!(sink.stopped.contains(&samples::VR_AMBIENCE.to_string()));
        assert!(sink.stopped.contains(&samples::DPV.to_string()));
        assert!(sink.stopped.contains(&samples::DPV_HIGH.to_string()));
    }

    #[test]
    fn thruster_starts_only_once_moving() {
        let mut audio = LocomotionAudio::new();
        let mut sink = RecordingSink::default();
        audio.update(0.0, 0.0, &mut sink);
        assert!(sink.started.is_empty());
        audio.update(0.6, 0.2, &mut sink);
        assert!(sink.started.contains(&samples::DPV.to_string()));
        assert_eq!(sink.levels.last(), Some(&(samples::DPV_HIGH.to_string(), 0.2)));
    }
}
