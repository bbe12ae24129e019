use std::collections::VecDeque;

use tracing::{debug, trace};

use super::constants::{
    Command, DEFAULT_LAST_DURATION_US, HEADER, MIN_CAPTION_DURATION_US,
};
use super::decoder::{classify, parse_word, Debouncer, Token};
use super::instructions::InstructionBuffer;
use super::modes::{CaptionMode, FlushAction, ModeBuffers};
use super::position::PositionTracker;
use super::stash::CaptionStash;
use super::timing::{TimeTranslator, Timecode};
use super::SccOptions;
use crate::error::{CaptionError, Result};
use crate::model::Caption;

/// Decoder state for one SCC document. Consumed by [`SccReader::read`].
pub struct SccReader {
    simulate_roll_up: bool,
    debouncer: Debouncer,
    tracker: PositionTracker,
    modes: ModeBuffers,
    stash: CaptionStash,
    clock: TimeTranslator,
    roll_rows: VecDeque<InstructionBuffer>,
    roll_rows_expected: usize,
    /// Start time of the caption being built in roll-up or paint-on mode.
    time: i64,
}

impl SccReader {
    pub fn new(options: &SccOptions, offset_us: i64) -> Self {
        let tracker = if options.strict_positioning {
            PositionTracker::strict()
        } else {
            PositionTracker::with_default()
        };
        Self {
            simulate_roll_up: options.simulate_roll_up,
            debouncer: Debouncer::new(options.debounce),
            tracker,
            modes: ModeBuffers::new(),
            stash: CaptionStash::new(),
            clock: TimeTranslator::new(offset_us),
            roll_rows: VecDeque::new(),
            roll_rows_expected: 0,
            time: 0,
        }
    }

    /// Decodes a whole document into captions ordered by start time.
    pub fn read(mut self, content: &str) -> Result<Vec<Caption>> {
        let mut lines = content.lines();
        let header = lines
            .next()
            .map(|l| l.trim_start_matches('\u{feff}').trim())
            .unwrap_or_default();
        if header != HEADER {
            return Err(CaptionError::InvalidFormat(format!(
                "missing '{HEADER}' header, found '{header}'"
            )));
        }

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.translate_line(line)?;
        }

        self.finish()
    }

    fn translate_line(&mut self, line: &str) -> Result<()> {
        let mut parts = line.split_whitespace();
        let Some(timecode) = parts.next() else {
            return Ok(());
        };
        self.clock.start_at(Timecode::parse(timecode)?);

        for word in parts {
            self.translate_word(word)?;
            self.clock.increment_frames();
        }
        Ok(())
    }

    fn translate_word(&mut self, raw: &str) -> Result<()> {
        let Some((word, token)) = parse_word(raw).and_then(|w| classify(w).map(|t| (w, t))) else {
            trace!(word = raw, "skipping unrecognized scc word");
            return Ok(());
        };
        if !self.debouncer.accept(word, &token) {
            return Ok(());
        }

        let active = self.modes.active();
        match token {
            Token::Command(command) => self.translate_command(command)?,
            Token::Pac(pac) => self
                .modes
                .buffer_mut(active)
                .interpret_pac(&mut self.tracker, pac)?,
            Token::Special(ch) => {
                let mut buf = [0u8; 4];
                self.modes
                    .buffer_mut(active)
                    .add_chars(&mut self.tracker, ch.encode_utf8(&mut buf))?;
            }
            Token::Extended(ext) => self
                .modes
                .buffer_mut(active)
                .add_extended(&mut self.tracker, ext)?,
            Token::Chars(chars) => self
                .modes
                .buffer_mut(active)
                .add_chars(&mut self.tracker, &chars)?,
        }
        Ok(())
    }

    fn translate_command(&mut self, command: Command) -> Result<()> {
        let now = self.clock.time();
        match command {
            Command::ResumeCaptionLoading => self.activate(CaptionMode::PopOn),
            Command::ResumeDirectCaptioning => {
                self.activate(CaptionMode::PaintOn);
                let paint = self.modes.take(CaptionMode::PaintOn);
                self.stash.create_and_store(paint, self.time);
                self.time = now;
            }
            Command::RollUp(rows) => {
                self.roll_rows_expected = usize::from(rows);
                self.activate(CaptionMode::RollUp);
                let roll = self.modes.take(CaptionMode::RollUp);
                self.stash.create_and_store(roll, self.time);
                self.roll_rows.clear();
                self.time = now;
            }
            Command::EraseNonDisplayedMemory => {
                self.modes.take(CaptionMode::PopOn);
            }
            Command::EndOfCaption => {
                self.time = now;
                let buffer = self.modes.take(self.modes.active());
                self.stash.create_and_store(buffer, self.time);
            }
            Command::CarriageReturn => {
                if self.modes.active() == CaptionMode::RollUp {
                    self.roll_up();
                }
            }
            Command::EraseDisplayedMemory => {
                self.roll_rows.clear();
                if self.modes.active() == CaptionMode::PaintOn {
                    let paint = self.modes.take(CaptionMode::PaintOn);
                    self.stash.create_and_store(paint, self.time);
                }
                self.stash.correct_last_timing(now, false);
            }
            Command::Backspace | Command::TabOffset(_) | Command::MidRow { .. } => {
                self.modes
                    .active_buffer_mut()
                    .interpret_command(&mut self.tracker, command)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn activate(&mut self, mode: CaptionMode) {
        let Some((old, action)) = self.modes.activate(mode) else {
            return;
        };
        match action {
            FlushAction::RollUp => self.roll_up(),
            FlushAction::StashPaint => {
                let buffer = self.modes.take(old);
                self.stash.create_and_store(buffer, self.time);
            }
        }
    }

    /// Turns the roll-up buffer into a caption that lasts until now.
    fn roll_up(&mut self) {
        let now = self.clock.time();
        let buffer = self.modes.take(CaptionMode::RollUp);

        let content = if self.simulate_roll_up && self.roll_rows_expected > 1 {
            if !buffer.is_empty() {
                if self.roll_rows.len() >= self.roll_rows_expected {
                    self.roll_rows.pop_front();
                }
                self.roll_rows.push_back(buffer);
            }
            InstructionBuffer::from_rows(&self.roll_rows)
        } else {
            buffer
        };

        self.stash.create_and_store(content, self.time);
        self.time = now;
        self.stash.correct_last_timing(now, true);
    }

    fn finish(mut self) -> Result<Vec<Caption>> {
        if !self.modes.buffer(CaptionMode::RollUp).is_empty() {
            self.roll_up();
        }
        let paint = self.modes.take(CaptionMode::PaintOn);
        self.stash.create_and_store(paint, self.time);

        let mut captions = self.stash.into_captions();

        if let Some(c) = captions
            .iter()
            .find(|c| c.duration() > 0 && c.duration() < MIN_CAPTION_DURATION_US)
        {
            return Err(CaptionError::InvalidFormat(format!(
                "unsupported cue duration around {} for caption '{}'",
                super::timing::format_timecode(c.start),
                c.text()
            )));
        }

        if captions.is_empty() {
            return Err(CaptionError::NoCaptions("empty SCC document".to_string()));
        }

        for caption in captions.iter_mut().filter(|c| c.is_open()) {
            caption.end = caption.start + DEFAULT_LAST_DURATION_US;
        }
        if let Some(c) = captions.iter().find(|c| c.end < c.start) {
            return Err(CaptionError::InvalidInput(format!(
                "caption '{}' ends at {} before it starts at {}",
                c.text(),
                super::timing::format_timecode(c.end),
                super::timing::format_timecode(c.start)
            )));
        }
        captions.sort_by_key(|c| c.start);

        debug!(captions = captions.len(), "scc decoded");
        Ok(captions)
    }
}
