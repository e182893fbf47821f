// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Piezo buzzer on a variable-frequency PWM channel.
//!
//! A tone is a 50% square wave at the requested pitch. Playback is blocking: `play` sounds the note
//! for its full duration, then silences the channel.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;
use log::trace;
use micromath::F32Ext;

use crate::hw::{self, SetFrequency, DUTY_MAX};

/// Half of full scale in the 16-bit convention: a square wave.
const SQUARE_WAVE_DUTY: u16 = 1 << 15;

/// One melody element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Note {
    /// Silence for the duration.
    Rest,
    /// Pitch in Hz.
    Tone(f32),
}

/// Named pitches, equal temperament, A4 = 440 Hz.
pub mod notes {
    use super::Note;

    pub const REST: Note = Note::Rest;

    pub const C4: Note = Note::Tone(261.63);
    pub const CS4: Note = Note::Tone(277.18);
    pub const D4: Note = Note::Tone(293.66);
    pub const DS4: Note = Note::Tone(311.13);
    pub const E4: Note = Note::Tone(329.63);
    pub const F4: Note = Note::Tone(349.23);
    pub const FS4: Note = Note::Tone(369.99);
    pub const G4: Note = Note::Tone(392.00);
    pub const GS4: Note = Note::Tone(415.30);
    pub const A4: Note = Note::Tone(440.00);
    pub const AS4: Note = Note::Tone(466.16);
    pub const B4: Note = Note::Tone(493.88);

    pub const C5: Note = Note::Tone(523.25);
    pub const CS5: Note = Note::Tone(554.37);
    pub const D5: Note = Note::Tone(587.33);
    pub const DS5: Note = Note::Tone(622.25);
    pub const E5: Note = Note::Tone(659.25);
    pub const F5: Note = Note::Tone(698.46);
    pub const FS5: Note = Note::Tone(739.99);
    pub const G5: Note = Note::Tone(783.99);
    pub const GS5: Note = Note::Tone(830.61);
    pub const A5: Note = Note::Tone(880.00);
    pub const AS5: Note = Note::Tone(932.33);
    pub const B5: Note = Note::Tone(987.77);
}

pub struct Buzzer<P, D> {
    pwm: P,
    delay: D,
}

impl<P, D> Buzzer<P, D>
where
    P: SetDutyCycle + SetFrequency,
    D: DelayNs,
{
    /// Take the channel and make sure it starts silent.
    pub fn new(pwm: P, delay: D) -> Self {
        let mut buzzer = Self { pwm, delay };
        buzzer.silence();
        buzzer
    }

    pub fn free(self) -> (P, D) {
        (self.pwm, self.delay)
    }

    /// Start a square wave at `hz`, rounded to the nearest whole hertz. Returns immediately.
    pub fn tone(&mut self, hz: f32) {
        let hz = F32Ext::round(hz.max(0.0)) as u32;
        trace!("buzzer {} Hz", hz);
        self.pwm.set_frequency(hz);
        self.pwm
            .set_duty_cycle_fraction(SQUARE_WAVE_DUTY, DUTY_MAX)
            .ok();
    }

    pub fn silence(&mut self) {
        self.pwm.set_duty_cycle_fully_off().ok();
    }

    /// Sound `note` for `duration` (or wait, for a rest), then silence.
    pub fn play(&mut self, note: Note, duration: Duration) {
        match note {
            Note::Rest => hw::sleep(&mut self.delay, duration),
            Note::Tone(hz) => {
                self.tone(hz);
                hw::sleep(&mut self.delay, duration);
                self.silence();
            }
        }
    }

    pub fn play_melody(&mut self, melody: &[(Note, Duration)]) {
        for &(note, duration) in melody {
            self.play(note, duration);
        }
    }
}
