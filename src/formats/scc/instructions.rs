use super::constants::{Command, ExtendedChar, Pac};
use super::position::{Position, PositionTracker};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    Text(String),
    Break,
    ItalicsOn,
    ItalicsOff,
    /// Following nodes belong to a new caption at the node's position.
    Repositioning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub position: Position,
}

impl Instruction {
    pub fn new(kind: InstructionKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn text(content: impl Into<String>, position: Position) -> Self {
        Self::new(InstructionKind::Text(content.into()), position)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, InstructionKind::Text(_))
    }

    pub fn is_italics(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::ItalicsOn | InstructionKind::ItalicsOff
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionBuffer {
    nodes: Vec<Instruction>,
}

impl InstructionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Instruction>) -> Self {
        Self { nodes }
    }

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a InstructionBuffer>) -> Self {
        let mut nodes: Vec<Instruction> = Vec::new();
        for row in rows {
            if let Some(last) = nodes.last_mut() {
                match &mut last.kind {
                    InstructionKind::Text(s) => s.push(' '),
                    _ => {
                        let position = last.position;
                        nodes.push(Instruction::text(" ", position));
                    }
                }
            }
            nodes.extend(row.nodes.iter().cloned());
        }
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Instruction] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Instruction> {
        self.nodes
    }

    pub fn is_empty(&self) -> bool {
        !self
            .nodes
            .iter()
            .any(|n| matches!(&n.kind, InstructionKind::Text(s) if !s.is_empty()))
    }

    pub fn add_chars(&mut self, tracker: &mut PositionTracker, chars: &str) -> Result<()> {
        if chars.is_empty() {
            return Ok(());
        }
        let position = tracker.current_position()?;

        if tracker.is_repositioning_required() {
            self.nodes
                .push(Instruction::new(InstructionKind::Repositioning, position));
            self.nodes.push(Instruction::text("", position));
            tracker.acknowledge_position_changed();
        } else if tracker.is_linebreak_required() {
            self.nodes
                .push(Instruction::new(InstructionKind::Break, position));
            self.nodes.push(Instruction::text("", position));
            tracker.acknowledge_linebreak_consumed();
        } else if !self.nodes.last().is_some_and(Instruction::is_text) {
            self.nodes.push(Instruction::text("", position));
        }

        if let Some(Instruction {
            kind: InstructionKind::Text(s),
            ..
        }) = self.nodes.last_mut()
        {
            s.push_str(chars);
        }
        Ok(())
    }

    pub fn interpret_pac(&mut self, tracker: &mut PositionTracker, pac: Pac) -> Result<()> {
        tracker.update_positioning(Position::new(pac.row, pac.col));
        if self.is_empty() {
            // nothing on screen yet to break from
            tracker.restart_at_cursor();
        }
        if pac.italics {
            let position = tracker.current_position()?;
            self.nodes
                .push(Instruction::new(InstructionKind::ItalicsOn, position));
        }
        Ok(())
    }

    pub fn interpret_command(
        &mut self,
        tracker: &mut PositionTracker,
        command: Command,
    ) -> Result<()> {
        match command {
            Command::MidRow { italics, .. } => {
                let kind = if italics {
                    InstructionKind::ItalicsOn
                } else {
                    InstructionKind::ItalicsOff
                };
                let position = tracker.current_position()?;
                self.nodes.push(Instruction::new(kind, position));
            }
            Command::TabOffset(columns) => tracker.tab_offset(columns),
            Command::Backspace => self.backspace(),
            _ => {}
        }
        Ok(())
    }

    /// Extended characters are sent after an ASCII stand-in for decoders
    /// that lack them; the stand-in is dropped here.
    pub fn add_extended(&mut self, tracker: &mut PositionTracker, ext: ExtendedChar) -> Result<()> {
        if let Some(substitute) = ext.substitute {
            self.remove_ascii_duplicate(substitute);
        }
        let mut buf = [0u8; 4];
        self.add_chars(tracker, ext.ch.encode_utf8(&mut buf))
    }

    fn remove_ascii_duplicate(&mut self, substitute: char) {
        if let Some(Instruction {
            kind: InstructionKind::Text(s),
            ..
        }) = self.nodes.last_mut()
        {
            if s.ends_with(substitute) {
                s.pop();
            }
        }
    }

    fn backspace(&mut self) {
        for node in self.nodes.iter_mut().rev() {
            if let InstructionKind::Text(s) = &mut node.kind {
                if s.pop().is_some() {
                    return;
                }
            }
        }
    }
}
