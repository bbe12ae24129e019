use crate::error::{CaptionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
    pub drop_frame: bool,
}

impl Timecode {
    pub fn parse(s: &str) -> Result<Self> {
        let t = s.trim();
        let drop_frame = t.contains(';') || t.contains(',');
        let parts: Vec<&str> = t.split([':', ';', ',', '.']).collect();
        if parts.len() != 4 {
            return Err(CaptionError::Syntax(format!("unrecognized timecode: '{t}'")));
        }

        let num = |p: &str, what: &str| -> Result<u32> {
            p.parse()
                .map_err(|_| CaptionError::Syntax(format!("bad {what} in timecode: '{t}'")))
        };

        Ok(Self {
            hours: num(parts[0], "hours")?,
            minutes: num(parts[1], "minutes")?,
            seconds: num(parts[2], "seconds")?,
            frames: num(parts[3], "frames")?,
            drop_frame,
        })
    }

    /// Microseconds for this timecode plus `extra_frames`.
    ///
    /// Drop-frame timecode tracks the wall clock. Non-drop-frame counts 30
    /// frames per timecode second, which runs 1001/1000 slower than real
    /// time at 29.97 fps.
    pub fn to_microseconds(&self, extra_frames: u32) -> f64 {
        let seconds = f64::from(self.hours) * 3600.0
            + f64::from(self.minutes) * 60.0
            + f64::from(self.seconds)
            + f64::from(self.frames + extra_frames) / 30.0;
        let scale = if self.drop_frame { 1.0 } else { 1001.0 / 1000.0 };
        seconds * scale * 1_000_000.0
    }
}

pub fn format_timecode(microseconds: i64) -> String {
    let timecode_us = microseconds.max(0) * 1000 / 1001;
    let total_seconds = timecode_us / 1_000_000;
    let frames = (timecode_us % 1_000_000) * 30 / 1_000_000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;
    format!("{hours:02}:{minutes:02}:{seconds:02}:{frames:02}")
}

#[derive(Debug, Clone, Default)]
pub struct TimeTranslator {
    timecode: Timecode,
    frames: u32,
    offset_us: i64,
}

impl TimeTranslator {
    pub fn new(offset_us: i64) -> Self {
        Self {
            offset_us,
            ..Self::default()
        }
    }

    pub fn start_at(&mut self, timecode: Timecode) {
        self.timecode = timecode;
        self.frames = 0;
    }

    pub fn increment_frames(&mut self) {
        self.frames += 1;
    }

    pub fn time(&self) -> i64 {
        let us = self.timecode.to_microseconds(self.frames).round() as i64 - self.offset_us;
        us.max(0)
    }
}
