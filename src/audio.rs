//! Audio cues
//!
//! Procedurally generated tones and a looping chiptune groove - no external
//! files needed! The game core only emits fire-and-forget cues; the
//! [`CuePlayer`] behind them decides how (or whether) they sound.

use crate::settings::Settings;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A single fire-and-forget beep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Hz
    pub frequency: f32,
    pub waveform: Waveform,
    /// Peak gain (0.0 - 1.0)
    pub volume: f32,
    /// Seconds
    pub duration: f32,
    /// Gain the envelope decays to by the end of the tone
    pub floor: f32,
}

impl Tone {
    pub const DEFAULT_VOLUME: f32 = 0.1;
    pub const DEFAULT_DURATION: f32 = 0.1;
    pub const DEFAULT_FLOOR: f32 = 0.01;

    pub fn new(frequency: f32, waveform: Waveform) -> Self {
        Self {
            frequency,
            waveform,
            volume: Self::DEFAULT_VOLUME,
            duration: Self::DEFAULT_DURATION,
            floor: Self::DEFAULT_FLOOR,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor;
        self
    }

    /// Where the decay envelope ends when the tone starts at `gain`.
    /// Never above the start and never zero (exponential ramps can't reach it).
    pub fn decay_target(&self, gain: f32) -> f32 {
        self.floor.min(gain).max(f32::MIN_POSITIVE)
    }
}

/// A tone placed at an absolute audio-clock time (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub tone: Tone,
    pub at: f64,
}

/// Sound output used by the game core
pub trait CuePlayer {
    fn play_tone(&mut self, tone: Tone);
    fn start_ambient(&mut self);
    fn stop_ambient(&mut self);
    /// Playback rate multiplier for the ambient loop
    fn set_ambient_tempo(&mut self, multiplier: f32);
    /// Descending game-over phrase; silences the ambient loop
    fn play_end_phrase(&mut self);

    /// Wake a suspended output (browsers require a user gesture)
    fn resume(&mut self) {}

    /// Feed the ambient loop; called by the driver every frame
    fn pump(&mut self) {}
}

// === Ambient groove ===

/// Steps in the loop
pub const LOOP_STEPS: usize = 16;
/// Seconds per 16th note at tempo 1.0
pub const SECONDS_PER_STEP: f64 = 0.125;
/// How far ahead of the audio clock notes are queued
pub const LOOKAHEAD_SECS: f64 = 0.1;
/// Envelope floor for loop notes, quieter than one-shot cues
pub const LOOP_FLOOR: f32 = 0.001;

/// C - E - G - A - A# - A - G - E lead, rests on odd steps
const MELODY: [f32; LOOP_STEPS] = [
    523.25, 0.0, 659.25, 0.0, 783.99, 0.0, 880.00, 0.0, 932.33, 0.0, 880.00, 0.0, 783.99, 0.0,
    659.25, 0.0,
];
/// Bass line, played an octave down
const BASS: [f32; LOOP_STEPS] = [
    261.63, 261.63, 329.63, 329.63, 392.00, 392.00, 440.00, 440.00, 466.16, 466.16, 440.00,
    440.00, 392.00, 392.00, 329.63, 329.63,
];

/// Step sequencer for the background loop
///
/// Pure bookkeeping: given the audio clock it says which notes to queue.
#[derive(Debug, Clone)]
pub struct AmbientSequencer {
    playing: bool,
    tempo: f32,
    next_note_time: f64,
    step: usize,
}

impl Default for AmbientSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl AmbientSequencer {
    pub fn new() -> Self {
        Self {
            playing: false,
            tempo: 1.0,
            next_note_time: 0.0,
            step: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    /// Start looping at audio time `now`. No-op if already playing.
    pub fn start(&mut self, now: f64) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.next_note_time = now + LOOKAHEAD_SECS;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn set_tempo(&mut self, multiplier: f32) {
        if multiplier > 0.0 {
            self.tempo = multiplier;
        }
    }

    /// Notes that fall inside the look-ahead window from `now`
    pub fn due_notes(&mut self, now: f64) -> Vec<Note> {
        let mut notes = Vec::new();
        if !self.playing {
            return notes;
        }
        while self.next_note_time < now + LOOKAHEAD_SECS {
            let at = self.next_note_time;
            let step = self.step % LOOP_STEPS;

            if MELODY[step] > 0.0 {
                notes.push(Note {
                    tone: Tone::new(MELODY[step], Waveform::Square)
                        .with_volume(0.02)
                        .with_duration(0.1)
                        .with_floor(LOOP_FLOOR),
                    at,
                });
            }
            if BASS[step] > 0.0 {
                notes.push(Note {
                    tone: Tone::new(BASS[step] / 2.0, Waveform::Triangle)
                        .with_volume(0.05)
                        .with_duration(0.2)
                        .with_floor(LOOP_FLOOR),
                    at,
                });
            }

            self.step += 1;
            self.next_note_time += SECONDS_PER_STEP / self.tempo as f64;
        }
        notes
    }
}

/// Game-over phrase: (Hz, seconds)
const END_PHRASE: [(f32, f32); 5] = [
    (392.00, 0.5),
    (311.13, 0.5),
    (261.63, 0.5),
    (196.00, 1.0),
    (155.56, 1.5),
];

/// Schedule the descending game-over phrase starting at `start`.
/// Each note begins at 80% of the previous note's length.
pub fn end_phrase(start: f64) -> Vec<Note> {
    let mut at = start;
    END_PHRASE
        .iter()
        .map(|&(freq, dur)| {
            let note = Note {
                tone: Tone::new(freq, Waveform::Sine)
                    .with_volume(0.15)
                    .with_duration(dur),
                at,
            };
            at += dur as f64 * 0.8;
            note
        })
        .collect()
}

/// Output mix derived from settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mix {
    pub sfx: f32,
    pub music: f32,
}

impl Mix {
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.muted {
            return Self { sfx: 0.0, music: 0.0 };
        }
        let master = settings.master_volume.clamp(0.0, 1.0);
        Self {
            sfx: master * settings.sfx_volume.clamp(0.0, 1.0),
            music: master * settings.music_volume.clamp(0.0, 1.0),
        }
    }
}

/// Cue player with no output device. Tracks the ambient state so headless
/// runs can log what would have played.
#[derive(Debug, Default)]
pub struct SilentCuePlayer {
    pub ambient: AmbientSequencer,
    pub tones_played: u32,
}

impl CuePlayer for SilentCuePlayer {
    fn play_tone(&mut self, tone: Tone) {
        self.tones_played += 1;
        log::trace!("tone {:.0}Hz {:?}", tone.frequency, tone.waveform);
    }

    fn start_ambient(&mut self) {
        self.ambient.start(0.0);
    }

    fn stop_ambient(&mut self) {
        self.ambient.stop();
    }

    fn set_ambient_tempo(&mut self, multiplier: f32) {
        self.ambient.set_tempo(multiplier);
    }

    fn play_end_phrase(&mut self) {
        self.ambient.stop();
        log::debug!("end phrase ({} notes)", END_PHRASE.len());
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioCuePlayer;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::*;

    /// Web Audio API output
    pub struct WebAudioCuePlayer {
        ctx: Option<AudioContext>,
        mix: Mix,
        sequencer: AmbientSequencer,
    }

    impl WebAudioCuePlayer {
        pub fn new(settings: &Settings) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                mix: Mix::from_settings(settings),
                sequencer: AmbientSequencer::new(),
            }
        }

        fn now(&self) -> f64 {
            self.ctx.as_ref().map(|c| c.current_time()).unwrap_or(0.0)
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            waveform: Waveform,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(match waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            });
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Play a note with an exponential decay envelope
        fn schedule(&self, note: Note, scale: f32) {
            let vol = note.tone.volume * scale;
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            let Some((osc, gain)) = Self::create_osc(ctx, note.tone.frequency, note.tone.waveform)
            else {
                return;
            };
            let t = note.at;
            let end = t + note.tone.duration as f64;

            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(note.tone.decay_target(vol), end)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(end).ok();
        }
    }

    impl CuePlayer for WebAudioCuePlayer {
        fn play_tone(&mut self, tone: Tone) {
            let at = self.now();
            self.schedule(Note { tone, at }, self.mix.sfx);
        }

        fn start_ambient(&mut self) {
            let now = self.now();
            self.sequencer.start(now);
        }

        fn stop_ambient(&mut self) {
            self.sequencer.stop();
        }

        fn set_ambient_tempo(&mut self, multiplier: f32) {
            self.sequencer.set_tempo(multiplier);
        }

        fn play_end_phrase(&mut self) {
            self.sequencer.stop();
            for note in end_phrase(self.now()) {
                self.schedule(note, self.mix.music);
            }
        }

        fn resume(&mut self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }

        fn pump(&mut self) {
            let now = self.now();
            for note in self.sequencer.due_notes(now) {
                self.schedule(note, self.mix.music);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_defaults() {
        let tone = Tone::new(600.0, Waveform::Square);
        assert_eq!(tone.volume, 0.1);
        assert_eq!(tone.duration, 0.1);
    }

    #[test]
    fn test_envelopes_decay_to_fixed_floor() {
        let cue = Tone::new(600.0, Waveform::Square);
        assert_eq!(cue.floor, 0.01);
        // Independent of the mix level
        assert_eq!(cue.decay_target(0.1), 0.01);
        assert_eq!(cue.decay_target(0.05), 0.01);
        // Quieter than the floor: hold rather than ramp up
        assert_eq!(cue.decay_target(0.004), 0.004);
        assert!(cue.decay_target(0.0) > 0.0);

        let mut seq = AmbientSequencer::new();
        seq.start(0.0);
        let notes = seq.due_notes(1.0);
        assert!(!notes.is_empty());
        assert!(notes.iter().all(|n| n.tone.floor == LOOP_FLOOR));
        assert!(end_phrase(0.0).iter().all(|n| n.tone.floor == Tone::DEFAULT_FLOOR));
    }

    #[test]
    fn test_silent_player_counts_cues() {
        let mut player = SilentCuePlayer::default();
        player.start_ambient();
        player.play_tone(Tone::new(150.0, Waveform::Sawtooth));
        player.play_tone(Tone::new(650.0, Waveform::Square));
        assert_eq!(player.tones_played, 2);
        assert!(player.ambient.is_playing());
        player.play_end_phrase();
        assert!(!player.ambient.is_playing());
    }

    #[test]
    fn test_sequencer_silent_until_started() {
        let mut seq = AmbientSequencer::new();
        assert!(seq.due_notes(10.0).is_empty());
    }

    #[test]
    fn test_sequencer_fills_lookahead_window() {
        let mut seq = AmbientSequencer::new();
        seq.start(0.0);
        // First note at 0.1; window up to 0.2 holds steps at 0.1
        let notes = seq.due_notes(0.1);
        assert_eq!(notes.len(), 2, "lead + bass on step 0");
        assert!((notes[0].at - 0.1).abs() < 1e-9);
        assert!(notes.iter().any(|n| n.tone.waveform == Waveform::Square));
        assert!(notes
            .iter()
            .any(|n| n.tone.waveform == Waveform::Triangle && n.tone.frequency == 261.63 / 2.0));

        // Step 1 is a rest for the lead
        let notes = seq.due_notes(0.2);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].tone.waveform, Waveform::Triangle);
    }

    #[test]
    fn test_faster_tempo_packs_more_steps() {
        let mut slow = AmbientSequencer::new();
        let mut fast = AmbientSequencer::new();
        slow.start(0.0);
        fast.start(0.0);
        fast.set_tempo(2.0);
        assert!(fast.due_notes(2.0).len() > slow.due_notes(2.0).len());
    }

    #[test]
    fn test_stop_and_restart_keeps_tempo() {
        let mut seq = AmbientSequencer::new();
        seq.start(0.0);
        seq.set_tempo(1.5);
        seq.stop();
        assert!(seq.due_notes(5.0).is_empty());
        seq.start(5.0);
        assert!(seq.is_playing());
        assert_eq!(seq.tempo(), 1.5);
    }

    #[test]
    fn test_end_phrase_descends_and_overlaps() {
        let notes = end_phrase(1.0);
        assert_eq!(notes.len(), 5);
        assert!(notes
            .windows(2)
            .all(|w| w[1].tone.frequency < w[0].tone.frequency));
        assert!((notes[1].at - 1.4).abs() < 1e-6);
        assert!((notes[4].at - (1.0 + 0.4 + 0.4 + 0.4 + 0.8)).abs() < 1e-6);
    }

    #[test]
    fn test_mix_respects_mute() {
        let mut settings = Settings::default();
        let mix = Mix::from_settings(&settings);
        assert!(mix.sfx > 0.0 && mix.music > 0.0);
        settings.muted = true;
        assert_eq!(Mix::from_settings(&settings), Mix { sfx: 0.0, music: 0.0 });
    }
}
