use super::instructions::InstructionBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionMode {
    #[default]
    PopOn,
    RollUp,
    PaintOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushAction {
    RollUp,
    StashPaint,
}

/// Pop-on content only shows on an explicit end-of-caption, so leaving it
/// never flushes. Roll-up and paint-on content is already on screen and
/// must not be dropped.
pub fn transition(old: CaptionMode, new: CaptionMode) -> Option<FlushAction> {
    if old == new {
        return None;
    }
    match old {
        CaptionMode::PopOn => None,
        CaptionMode::RollUp => Some(FlushAction::RollUp),
        CaptionMode::PaintOn => Some(FlushAction::StashPaint),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModeBuffers {
    active: CaptionMode,
    pop_on: InstructionBuffer,
    roll_up: InstructionBuffer,
    paint_on: InstructionBuffer,
}

impl ModeBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> CaptionMode {
        self.active
    }

    pub fn activate(&mut self, mode: CaptionMode) -> Option<(CaptionMode, FlushAction)> {
        let old = self.active;
        self.active = mode;
        let action = transition(old, mode)?;
        if self.buffer(old).is_empty() {
            return None;
        }
        tracing::trace!(?old, new = ?mode, ?action, "scc mode switch flush");
        Some((old, action))
    }

    pub fn buffer(&self, mode: CaptionMode) -> &InstructionBuffer {
        match mode {
            CaptionMode::PopOn => &self.pop_on,
            CaptionMode::RollUp => &self.roll_up,
            CaptionMode::PaintOn => &self.paint_on,
        }
    }

    pub fn buffer_mut(&mut self, mode: CaptionMode) -> &mut InstructionBuffer {
        match mode {
            CaptionMode::PopOn => &mut self.pop_on,
            CaptionMode::RollUp => &mut self.roll_up,
            CaptionMode::PaintOn => &mut self.paint_on,
        }
    }

    pub fn active_buffer_mut(&mut self) -> &mut InstructionBuffer {
        self.buffer_mut(self.active)
    }

    pub fn take(&mut self, mode: CaptionMode) -> InstructionBuffer {
        std::mem::take(self.buffer_mut(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::scc::instructions::Instruction;
    use crate::formats::scc::position::Position;

    #[test]
    fn transition_table() {
        use CaptionMode::*;
        assert_eq!(transition(PopOn, RollUp), None);
        assert_eq!(transition(PopOn, PaintOn), None);
        assert_eq!(transition(RollUp, RollUp), None);
        assert_eq!(transition(RollUp, PopOn), Some(FlushAction::RollUp));
        assert_eq!(transition(RollUp, PaintOn), Some(FlushAction::RollUp));
        assert_eq!(transition(PaintOn, PopOn), Some(FlushAction::StashPaint));
        assert_eq!(transition(PaintOn, RollUp), Some(FlushAction::StashPaint));
        assert_eq!(transition(PaintOn, PaintOn), None);
    }

    #[test]
    fn starts_in_pop_on() {
        assert_eq!(ModeBuffers::new().active(), CaptionMode::PopOn);
    }

    #[test]
    fn empty_buffers_do_not_flush() {
        let mut modes = ModeBuffers::new();
        assert_eq!(modes.activate(CaptionMode::PaintOn), None);
        assert_eq!(modes.activate(CaptionMode::PopOn), None);
    }

    #[test]
    fn leaving_paint_on_with_content_flushes_it() {
        let mut modes = ModeBuffers::new();
        modes.activate(CaptionMode::PaintOn);
        *modes.active_buffer_mut() =
            InstructionBuffer::from_nodes(vec![Instruction::text("x", Position::new(15, 0))]);
        assert_eq!(
            modes.activate(CaptionMode::PopOn),
            Some((CaptionMode::PaintOn, FlushAction::StashPaint))
        );
        assert!(!modes.buffer(CaptionMode::PaintOn).is_empty());
        assert!(modes.take(CaptionMode::PaintOn).nodes().len() == 1);
        assert!(modes.buffer(CaptionMode::PaintOn).is_empty());
    }
}
