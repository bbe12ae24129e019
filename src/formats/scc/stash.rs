use super::instructions::{InstructionBuffer, InstructionKind};
use super::normalize::normalize;
use super::position::Position;
use crate::model::{Caption, CaptionNode, Layout};

/// Finished captions plus the batch stored last, whose end time may still
/// be corrected.
#[derive(Debug, Clone, Default)]
pub struct CaptionStash {
    captions: Vec<Caption>,
    still_editing: usize,
}

impl CaptionStash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes `buffer` and stores the captions it describes, all
    /// starting at `start`. A buffer without text stores nothing.
    ///
    /// The previous batch, if still open, ends where this one starts.
    pub fn create_and_store(&mut self, buffer: InstructionBuffer, start: i64) {
        if buffer.is_empty() {
            return;
        }
        self.correct_last_timing(start, false);

        let batch: Vec<Caption> = build_captions(buffer, start)
            .into_iter()
            .filter(Caption::has_text)
            .collect();
        if batch.is_empty() {
            return;
        }
        self.still_editing = self.captions.len();
        self.captions.extend(batch);
    }

    pub fn correct_last_timing(&mut self, end: i64, force: bool) {
        let Some(last) = self.captions.last() else {
            return;
        };
        if !force && last.end != 0 {
            return;
        }
        for caption in &mut self.captions[self.still_editing..] {
            caption.end = end;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn into_captions(self) -> Vec<Caption> {
        self.captions
    }
}

fn new_caption(start: i64, position: Position) -> Caption {
    let mut caption = Caption::new(start, 0, Vec::new());
    caption.layout = Some(Layout::from_cell(position.row, position.col));
    caption
}

fn build_captions(buffer: InstructionBuffer, start: i64) -> Vec<Caption> {
    let mut captions = Vec::new();
    let mut current: Option<Caption> = None;

    for node in normalize(buffer.into_nodes()) {
        if node.kind == InstructionKind::Repositioning {
            captions.extend(current.take());
            current = Some(new_caption(start, node.position));
            continue;
        }

        let caption = current.get_or_insert_with(|| new_caption(start, node.position));
        if node.kind == InstructionKind::Break && !caption.has_text() {
            continue;
        }
        let caption_node = match node.kind {
            InstructionKind::Text(content) => CaptionNode::Text { content },
            InstructionKind::Break => CaptionNode::Break,
            InstructionKind::ItalicsOn => CaptionNode::italics(true),
            InstructionKind::ItalicsOff => CaptionNode::italics(false),
            InstructionKind::Repositioning => continue,
        };
        caption.nodes.push(caption_node);
    }

    captions.extend(current);
    captions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::scc::instructions::Instruction;

    fn buffer(parts: Vec<(InstructionKind, Position)>) -> InstructionBuffer {
        InstructionBuffer::from_nodes(
            parts
                .into_iter()
                .map(|(k, p)| Instruction::new(k, p))
                .collect(),
        )
    }

    fn text(s: &str) -> InstructionKind {
        InstructionKind::Text(s.to_string())
    }

    #[test]
    fn repositioning_splits_captions() {
        let low = Position::new(15, 0);
        let high = Position::new(1, 8);
        let mut stash = CaptionStash::new();
        stash.create_and_store(
            buffer(vec![
                (text("bottom"), low),
                (InstructionKind::Repositioning, high),
                (text("top"), high),
            ]),
            1_000,
        );
        let caps = stash.captions();
        assert_eq!(caps.len(), 2);
        assert_eq!(caps[0].text(), "bottom");
        assert_eq!(caps[1].text(), "top");
        assert_eq!(caps[1].start, 1_000);
        let origin = caps[1].layout.as_ref().and_then(|l| l.origin).unwrap();
        assert_eq!(origin.x, 25.0);
        assert_eq!(origin.y, 0.0);
    }

    #[test]
    fn leading_breaks_are_dropped() {
        let p = Position::new(15, 0);
        let mut stash = CaptionStash::new();
        stash.create_and_store(
            buffer(vec![
                (InstructionKind::Break, p),
                (text("one"), p),
                (InstructionKind::Break, p),
                (text("two"), p),
            ]),
            0,
        );
        assert_eq!(stash.captions()[0].text(), "one\ntwo");
    }

    #[test]
    fn next_batch_back_fills_open_end() {
        let p = Position::new(15, 0);
        let mut stash = CaptionStash::new();
        stash.create_and_store(buffer(vec![(text("one"), p)]), 1_000_000);
        stash.create_and_store(buffer(vec![(text("two"), p)]), 3_000_000);
        let caps = stash.captions();
        assert_eq!(caps[0].end, 3_000_000);
        assert_eq!(caps[1].end, 0);
    }

    #[test]
    fn forced_correction_overrides_known_end() {
        let p = Position::new(15, 0);
        let mut stash = CaptionStash::new();
        stash.create_and_store(buffer(vec![(text("one"), p)]), 1_000_000);
        stash.correct_last_timing(2_000_000, false);
        stash.correct_last_timing(2_500_000, false);
        assert_eq!(stash.captions()[0].end, 2_000_000);
        stash.correct_last_timing(2_500_000, true);
        assert_eq!(stash.captions()[0].end, 2_500_000);
    }

    #[test]
    fn empty_buffer_stores_nothing() {
        let mut stash = CaptionStash::new();
        stash.create_and_store(InstructionBuffer::new(), 1_000_000);
        stash.correct_last_timing(5, true);
        assert!(stash.is_empty());
    }

    #[test]
    fn italics_survive_as_style_nodes() {
        let p = Position::new(15, 0);
        let mut stash = CaptionStash::new();
        stash.create_and_store(
            buffer(vec![(InstructionKind::ItalicsOn, p), (text("it"), p)]),
            0,
        );
        let nodes = &stash.captions()[0].nodes;
        assert_eq!(
            nodes,
            &vec![
                CaptionNode::italics(true),
                CaptionNode::text("it"),
                CaptionNode::italics(false)
            ]
        );
    }
}
