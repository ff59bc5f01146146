//! Procedural sound: every cue is a short list of oscillator [`Tone`]s, so the
//! game never loads audio files. [`Melody`] steps the background loop from the
//! frame clock; [`AudioEngine`] turns tones into Web Audio nodes.

use wasm_bindgen::JsValue;
use web_sys::{AudioContext, GainNode, OscillatorType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    fn oscillator_type(self) -> OscillatorType {
        match self {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
            Waveform::Triangle => OscillatorType::Triangle,
        }
    }
}

/// One oscillator burst with exponential frequency and gain ramps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub offset: f64,   // seconds after the cue starts
    pub duration: f64, // seconds
    pub freq_start: f32,
    pub freq_end: f32,
    pub gain_start: f32,
    pub gain_end: f32,
}

impl Tone {
    const fn new(waveform: Waveform, offset: f64, duration: f64, freq: (f32, f32), gain: (f32, f32)) -> Self {
        Self {
            waveform,
            offset,
            duration,
            freq_start: freq.0,
            freq_end: freq.1,
            gain_start: gain.0,
            gain_end: gain.1,
        }
    }

    pub fn end(&self) -> f64 {
        self.offset + self.duration
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Jump,
    Item,
    Hit,
    Tap,
    GameOver,
}

const JUMP: [Tone; 1] = [Tone::new(Waveform::Sine, 0.0, 0.15, (300.0, 600.0), (0.3, 0.01))];
const ITEM: [Tone; 2] = [
    Tone::new(Waveform::Sine, 0.0, 0.3, (800.0, 1600.0), (0.2, 0.01)),
    Tone::new(Waveform::Sine, 0.05, 0.3, (1200.0, 2400.0), (0.15, 0.01)),
];
const HIT: [Tone; 1] = [Tone::new(Waveform::Sawtooth, 0.0, 0.2, (100.0, 50.0), (0.4, 0.01))];
const TAP: [Tone; 1] = [Tone::new(Waveform::Sine, 0.0, 0.05, (400.0, 200.0), (0.1, 0.01))];
// Descending A4 E4 A3 E3.
const GAME_OVER: [Tone; 4] = [
    Tone::new(Waveform::Sine, 0.0, 0.5, (440.0, 440.0), (0.2, 0.01)),
    Tone::new(Waveform::Sine, 0.2, 0.5, (330.0, 330.0), (0.2, 0.01)),
    Tone::new(Waveform::Sine, 0.4, 0.5, (220.0, 220.0), (0.2, 0.01)),
    Tone::new(Waveform::Sine, 0.6, 0.5, (165.0, 165.0), (0.2, 0.01)),
];

impl Cue {
    pub fn tones(self) -> &'static [Tone] {
        match self {
            Cue::Jump => &JUMP,
            Cue::Item => &ITEM,
            Cue::Hit => &HIT,
            Cue::Tap => &TAP,
            Cue::GameOver => &GAME_OVER,
        }
    }

    pub fn duration(self) -> f64 {
        self.tones().iter().map(Tone::end).fold(0.0, f64::max)
    }
}

// --- Background melody --------------------------------------------------------

/// (frequency Hz, beats in seconds); 0 Hz is a rest.
pub const BGM: [(f32, f64); 12] = [
    (523.25, 0.25), // C5
    (659.25, 0.25), // E5
    (783.99, 0.25), // G5
    (659.25, 0.25),
    (523.25, 0.5),
    (0.0, 0.25),
    (587.33, 0.25), // D5
    (698.46, 0.25), // F5
    (880.00, 0.25), // A5
    (698.46, 0.25),
    (587.33, 0.5),
    (0.0, 0.25),
];

/// Loops [`BGM`] off accumulated frame time instead of JS timeouts.
#[derive(Clone, Debug, Default)]
pub struct Melody {
    index: usize,
    elapsed: f64,
    started: bool,
    playing: bool,
}

impl Melody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if !self.playing {
            *self = Self {
                playing: true,
                ..Self::default()
            };
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance by `dt` seconds and return the note (never a rest) that begins
    /// inside this step. A frame spanning several steps skips the missed
    /// notes and only sounds the one it lands on.
    pub fn advance(&mut self, dt: f64) -> Vec<Tone> {
        let mut out = Vec::new();
        if !self.playing {
            return out;
        }
        if !self.started {
            self.started = true;
            self.push_note(&mut out);
        }
        self.elapsed += dt;
        let mut stepped = false;
        loop {
            let (_, len) = BGM[self.index];
            if self.elapsed < len {
                break;
            }
            self.elapsed -= len;
            self.index = (self.index + 1) % BGM.len();
            stepped = true;
        }
        if stepped {
            self.push_note(&mut out);
        }
        out
    }

    fn push_note(&self, out: &mut Vec<Tone>) {
        let (freq, len) = BGM[self.index];
        if freq > 0.0 {
            out.push(Tone::new(Waveform::Sine, 0.0, len, (freq, freq), (0.1, 0.01)));
        }
    }
}

// --- Web Audio playback -------------------------------------------------------

pub const MASTER_GAIN: f32 = 0.3;

pub struct AudioEngine {
    ctx: AudioContext,
    master: GainNode,
}

impl AudioEngine {
    pub fn new() -> Result<Self, JsValue> {
        let ctx = AudioContext::new()?;
        let master = ctx.create_gain()?;
        master.gain().set_value(MASTER_GAIN);
        master.connect_with_audio_node(&ctx.destination())?;
        Ok(Self { ctx, master })
    }

    /// Contexts created before a user gesture start suspended.
    pub fn resume(&self) {
        if let Err(e) = self.ctx.resume() {
            log::warn!("audio resume failed: {e:?}");
        }
    }

    pub fn play_cue(&self, cue: Cue) {
        self.play_tones(cue.tones());
    }

    pub fn play_tones(&self, tones: &[Tone]) {
        let now = self.ctx.current_time();
        for tone in tones {
            if let Err(e) = self.schedule(tone, now) {
                log::warn!("audio tone dropped: {e:?}");
            }
        }
    }

    fn schedule(&self, tone: &Tone, now: f64) -> Result<(), JsValue> {
        let osc = self.ctx.create_oscillator()?;
        let gain = self.ctx.create_gain()?;
        osc.set_type(tone.waveform.oscillator_type());
        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&self.master)?;

        let start = now + tone.offset;
        let end = start + tone.duration;
        let freq = osc.frequency();
        freq.set_value_at_time(tone.freq_start, start)?;
        if tone.freq_end != tone.freq_start {
            freq.exponential_ramp_to_value_at_time(tone.freq_end, end)?;
        }
        let g = gain.gain();
        g.set_value_at_time(tone.gain_start, start)?;
        g.exponential_ramp_to_value_at_time(tone.gain_end, end)?;

        osc.start_with_when(start)?;
        osc.stop_with_when(end)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_cue_has_delayed_second_voice() {
        let tones = Cue::Item.tones();
        assert_eq!(tones.len(), 2);
        assert!((tones[1].offset - 0.05).abs() < 1e-9);
        assert!((Cue::Item.duration() - 0.35).abs() < 1e-9);
    }

    #[test]
    fn game_over_descends() {
        let t = Cue::GameOver.tones();
        assert!(t.windows(2).all(|w| w[0].freq_start > w[1].freq_start));
        assert!((Cue::GameOver.duration() - 1.1).abs() < 1e-9);
    }

    #[test]
    fn melody_emits_first_note_then_steps() {
        let mut m = Melody::new();
        assert!(m.advance(0.1).is_empty(), "stopped melody is silent");
        m.start();
        let first = m.advance(0.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].freq_start, 523.25);
        assert!(m.advance(0.2).is_empty());
        let next = m.advance(0.06);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].freq_start, 659.25);
    }

    #[test]
    fn melody_skips_rests_and_loops() {
        let mut m = Melody::new();
        m.start();
        let total: f64 = BGM.iter().map(|(_, d)| d).sum();
        let mut notes = m.advance(0.0).len();
        let mut t = 0.0;
        while t < total {
            notes += m.advance(0.125).len();
            t += 0.125;
        }
        // One full loop later we are back on the first note: 10 notes + repeat.
        assert_eq!(notes, 11);
        m.stop();
        assert!(!m.is_playing());
    }

    #[test]
    fn long_frame_sounds_one_note() {
        let mut m = Melody::new();
        m.start();
        m.advance(0.0);
        assert!(m.advance(60.0).len() <= 1);
        // Still in step afterwards.
        let mut later = 0;
        for _ in 0..4 {
            later += m.advance(0.25).len();
        }
        assert!(later >= 2);
    }
}
