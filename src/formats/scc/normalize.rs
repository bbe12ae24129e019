//! Cleans a flushed instruction sequence into well-nested italics runs.
//!
//! The passes run in a fixed order; each one relies on what the earlier
//! ones already removed.

use super::instructions::{Instruction, InstructionKind};

pub fn normalize(nodes: Vec<Instruction>) -> Vec<Instruction> {
    let nodes = skip_initial_italics_off(nodes);
    let nodes = skip_empty_text(nodes);
    let nodes = skip_redundant_italics(nodes);
    let nodes = close_italics_before_repositioning(nodes);
    let nodes = close_trailing_italics(nodes);
    let nodes = remove_pairs(nodes, &InstructionKind::ItalicsOn, &InstructionKind::ItalicsOff);
    remove_pairs(nodes, &InstructionKind::ItalicsOff, &InstructionKind::ItalicsOn)
}

fn skip_initial_italics_off(nodes: Vec<Instruction>) -> Vec<Instruction> {
    let mut seen_on = false;
    nodes
        .into_iter()
        .filter(|n| match n.kind {
            InstructionKind::ItalicsOn => {
                seen_on = true;
                true
            }
            InstructionKind::ItalicsOff => seen_on,
            _ => true,
        })
        .collect()
}

fn skip_empty_text(nodes: Vec<Instruction>) -> Vec<Instruction> {
    nodes
        .into_iter()
        .filter(|n| !matches!(&n.kind, InstructionKind::Text(s) if s.is_empty()))
        .collect()
}

fn skip_redundant_italics(nodes: Vec<Instruction>) -> Vec<Instruction> {
    let mut italics = false;
    nodes
        .into_iter()
        .filter(|n| match n.kind {
            InstructionKind::ItalicsOn if italics => false,
            InstructionKind::ItalicsOff if !italics => false,
            InstructionKind::ItalicsOn => {
                italics = true;
                true
            }
            InstructionKind::ItalicsOff => {
                italics = false;
                true
            }
            _ => true,
        })
        .collect()
}

/// Each caption carries its own italics: an open run is closed before a
/// repositioning and reopened right after it.
fn close_italics_before_repositioning(nodes: Vec<Instruction>) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut open: Option<Instruction> = None;

    for node in nodes {
        match node.kind {
            InstructionKind::ItalicsOn => open = Some(node.clone()),
            InstructionKind::ItalicsOff => open = None,
            InstructionKind::Repositioning => {
                if let Some(on) = &open {
                    out.push(Instruction::new(InstructionKind::ItalicsOff, on.position));
                    out.push(node);
                    out.push(on.clone());
                    continue;
                }
            }
            _ => {}
        }
        out.push(node);
    }
    out
}

fn close_trailing_italics(mut nodes: Vec<Instruction>) -> Vec<Instruction> {
    let open = nodes.iter().rev().find(|n| n.is_italics()).and_then(|n| {
        (n.kind == InstructionKind::ItalicsOn).then_some(n.position)
    });
    if let Some(position) = open {
        nodes.push(Instruction::new(InstructionKind::ItalicsOff, position));
    }
    nodes
}

fn remove_pairs(
    nodes: Vec<Instruction>,
    first: &InstructionKind,
    second: &InstructionKind,
) -> Vec<Instruction> {
    let mut out: Vec<Instruction> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.kind == *second && out.last().is_some_and(|prev| prev.kind == *first) {
            out.pop();
            continue;
        }
        out.push(node);
    }
    out
}
