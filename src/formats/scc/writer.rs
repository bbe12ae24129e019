use textwrap::wrap;
use tracing::debug;

use super::constants::{
    pac_word_for_row, CHARACTER_TO_CODE, HEADER, MICROSECONDS_PER_CODEWORD, NULL_BYTE,
    SCREEN_COLUMNS, SCREEN_ROWS, SPECIAL_OR_EXTENDED_CHAR_TO_CODE, UNKNOWN_CHARACTER_WORD,
};
use super::timing::format_timecode;
use crate::formats::select_language;
use crate::model::{Caption, CaptionSet};

/// Control words around every caption: ENM and RCL before, EDM and EOC after.
const WORDS_AROUND_CAPTION: usize = 8;

/// Minimum gap, in codewords, for the previous caption to get its own clear.
const CLEAR_MARGIN_CODEWORDS: f64 = 3.0;

struct Scheduled {
    code_start: i64,
    end: Option<i64>,
    words: Vec<u16>,
}

pub fn write_scc(set: &CaptionSet, language: Option<&str>) -> String {
    let mut out = format!("{HEADER}\n\n");

    let Some(lang) = select_language(set, language) else {
        return out;
    };

    let mut scheduled: Vec<Scheduled> = set
        .captions(lang)
        .iter()
        .filter(|c| c.has_text())
        .map(schedule)
        .collect();

    let margin = (CLEAR_MARGIN_CODEWORDS * MICROSECONDS_PER_CODEWORD).round() as i64;
    for i in 1..scheduled.len() {
        let next_start = scheduled[i].code_start;
        let prev = &mut scheduled[i - 1];
        if prev.end.is_some_and(|end| end + margin >= next_start) {
            prev.end = None;
        }
    }

    for entry in &scheduled {
        let words: Vec<String> = entry.words.iter().map(|w| format!("{w:04x}")).collect();
        out.push_str(&format!(
            "{}\t94ae 94ae 9420 9420 {} 942c 942c 942f 942f\n\n",
            format_timecode(entry.code_start),
            words.join(" ")
        ));
        if let Some(end) = entry.end {
            out.push_str(&format!("{}\t942c 942c\n\n", format_timecode(end)));
        }
    }

    debug!(lang, captions = scheduled.len(), "scc encoded");
    out
}

fn schedule(caption: &Caption) -> Scheduled {
    let words = encode_caption(caption);
    let transmit = (words.len() + WORDS_AROUND_CAPTION) as f64 * MICROSECONDS_PER_CODEWORD;
    let code_start = (caption.start as f64 - transmit).round().max(0.0) as i64;
    Scheduled {
        code_start,
        end: (caption.end != 0).then_some(caption.end),
        words,
    }
}

/// Rows of at most 32 columns, bottom-aligned on the 15-row screen.
fn layout_rows(caption: &Caption) -> Vec<String> {
    let mut rows: Vec<String> = caption
        .text()
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .flat_map(|l| {
            wrap(l, SCREEN_COLUMNS)
                .into_iter()
                .map(|cow| cow.into_owned())
                .collect::<Vec<_>>()
        })
        .collect();
    rows.truncate(usize::from(SCREEN_ROWS));
    rows
}

fn encode_caption(caption: &Caption) -> Vec<u16> {
    let rows = layout_rows(caption);
    let first_row = SCREEN_ROWS + 1 - rows.len() as u8;
    let mut words = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let pac = pac_word_for_row(first_row + i as u8);
        words.push(pac);
        words.push(pac);

        let mut pending: Option<u8> = None;
        for ch in row.chars() {
            if let Some(byte) = CHARACTER_TO_CODE.get(&ch) {
                match pending.take() {
                    Some(hi) => words.push(u16::from_be_bytes([hi, *byte])),
                    None => pending = Some(*byte),
                }
                continue;
            }

            // two-byte codes start on a word boundary
            if let Some(hi) = pending.take() {
                words.push(u16::from_be_bytes([hi, NULL_BYTE]));
            }
            let code = SPECIAL_OR_EXTENDED_CHAR_TO_CODE
                .get(&ch)
                .copied()
                .unwrap_or(UNKNOWN_CHARACTER_WORD);
            words.push(code);
            words.push(code);
        }
        if let Some(hi) = pending {
            words.push(u16::from_be_bytes([hi, NULL_BYTE]));
        }
    }
    words
}
