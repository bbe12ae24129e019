//! CEA-608 code tables as they appear in SCC files.
//!
//! SCC words carry odd parity in bit 7 of each byte, so `RCL` on channel 1
//! is written `9420` rather than `1420`. Every table below is keyed by the
//! parity-carrying byte values.

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const HEADER: &str = "Scenarist_SCC V1.0";

/// Transmission time of one codeword at 29.97 fps.
pub const MICROSECONDS_PER_CODEWORD: f64 = 1_000_000.0 * 1001.0 / 30_000.0;

pub const DEFAULT_LAST_DURATION_US: i64 = 4_000_000;

pub const MIN_CAPTION_DURATION_US: i64 = 50_000;

pub const SCREEN_ROWS: u8 = 15;
pub const SCREEN_COLUMNS: usize = 32;

/// Written for characters that have no SCC encoding (the pound sign).
pub const UNKNOWN_CHARACTER_WORD: u16 = 0x91b6;

pub const NULL_BYTE: u8 = 0x80;

pub const fn with_parity(byte: u8) -> u8 {
    let b = byte & 0x7f;
    if b.count_ones() % 2 == 0 {
        b | 0x80
    } else {
        b
    }
}

pub const fn word(hi: u8, lo: u8) -> u16 {
    ((with_parity(hi) as u16) << 8) | with_parity(lo) as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ResumeCaptionLoading,
    Backspace,
    AlarmOff,
    AlarmOn,
    DeleteToEndOfRow,
    /// Roll-up with 2, 3 or 4 rows.
    RollUp(u8),
    FlashOn,
    ResumeDirectCaptioning,
    TextRestart,
    ResumeTextDisplay,
    EraseDisplayedMemory,
    CarriageReturn,
    EraseNonDisplayedMemory,
    EndOfCaption,
    /// Moves the cursor 1-3 columns right.
    TabOffset(u8),
    /// Mid-row attribute change.
    MidRow { italics: bool, underline: bool },
}

/// Preamble address code: cursor placement plus base style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pac {
    pub row: u8,
    pub col: u8,
    pub italics: bool,
    pub underline: bool,
}

/// High byte (no parity, channel 1) and row-block offset for rows 1-15.
const PAC_ROWS: [(u8, u8); 15] = [
    (0x11, 0x40),
    (0x11, 0x60),
    (0x12, 0x40),
    (0x12, 0x60),
    (0x15, 0x40),
    (0x15, 0x60),
    (0x16, 0x40),
    (0x16, 0x60),
    (0x17, 0x40),
    (0x17, 0x60),
    (0x10, 0x40),
    (0x13, 0x40),
    (0x13, 0x60),
    (0x14, 0x40),
    (0x14, 0x60),
];

const CHANNEL_BITS: [u8; 2] = [0x00, 0x08];

const MISC_CONTROL_BYTES: [u8; 2] = [0x14, 0x15];

fn misc_command(lo: u8) -> Option<Command> {
    let cmd = match lo {
        0x20 => Command::ResumeCaptionLoading,
        0x21 => Command::Backspace,
        0x22 => Command::AlarmOff,
        0x23 => Command::AlarmOn,
        0x24 => Command::DeleteToEndOfRow,
        0x25 => Command::RollUp(2),
        0x26 => Command::RollUp(3),
        0x27 => Command::RollUp(4),
        0x28 => Command::FlashOn,
        0x29 => Command::ResumeDirectCaptioning,
        0x2a => Command::TextRestart,
        0x2b => Command::ResumeTextDisplay,
        0x2c => Command::EraseDisplayedMemory,
        0x2d => Command::CarriageReturn,
        0x2e => Command::EraseNonDisplayedMemory,
        0x2f => Command::EndOfCaption,
        _ => return None,
    };
    Some(cmd)
}

pub static COMMANDS: Lazy<HashMap<u16, Command>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for channel in CHANNEL_BITS {
        for hi in MISC_CONTROL_BYTES {
            for lo in 0x20..=0x2f {
                if let Some(cmd) = misc_command(lo) {
                    map.insert(word(hi | channel, lo), cmd);
                }
            }
        }
        for n in 1..=3u8 {
            map.insert(word(0x17 | channel, 0x20 + n), Command::TabOffset(n));
        }
        for lo in 0x20..=0x2fu8 {
            let attr = (lo & 0x0e) >> 1;
            map.insert(
                word(0x11 | channel, lo),
                Command::MidRow {
                    italics: attr == 7,
                    underline: lo & 0x01 != 0,
                },
            );
        }
    }
    map
});

/// Preamble address codes, nested as high byte -> low byte -> PAC.
pub static PAC_BYTES_TO_POSITIONING: Lazy<HashMap<u8, HashMap<u8, Pac>>> = Lazy::new(|| {
    let mut map: HashMap<u8, HashMap<u8, Pac>> = HashMap::new();
    for channel in CHANNEL_BITS {
        for (idx, (hi, base)) in PAC_ROWS.iter().enumerate() {
            let row = idx as u8 + 1;
            let lows = map.entry(with_parity(hi | channel)).or_default();
            for offset in 0..0x20u8 {
                let attr = (offset & 0x0e) >> 1;
                let indent = offset & 0x10 != 0;
                lows.insert(
                    with_parity(base + offset),
                    Pac {
                        row,
                        col: if indent { attr * 4 } else { 0 },
                        italics: !indent && attr == 7,
                        underline: offset & 0x01 != 0,
                    },
                );
            }
        }
    }
    map
});

pub fn lookup_pac(word: u16) -> Option<Pac> {
    let [hi, lo] = word.to_be_bytes();
    PAC_BYTES_TO_POSITIONING.get(&hi)?.get(&lo).copied()
}

/// The plain white, column-0 PAC the writer uses for `row`.
pub fn pac_word_for_row(row: u8) -> u16 {
    let idx = usize::from(row.clamp(1, SCREEN_ROWS) - 1);
    let (hi, base) = PAC_ROWS[idx];
    word(hi, base + 0x10)
}

pub static CHARACTERS: Lazy<HashMap<u8, Option<char>>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(with_parity(0x00), None);
    for b in 0x20..=0x7fu8 {
        let ch = match b {
            0x2a => 'á',
            0x5c => 'é',
            0x5e => 'í',
            0x5f => 'ó',
            0x60 => 'ú',
            0x7b => 'ç',
            0x7c => '÷',
            0x7d => 'Ñ',
            0x7e => 'ñ',
            0x7f => '█',
            _ => b as char,
        };
        map.insert(with_parity(b), Some(ch));
    }
    map
});

const SPECIAL_CHARS_ROW: [char; 16] = [
    '®', '°', '½', '¿', '™', '¢', '£', '♪', 'à', ' ', 'è', 'â', 'ê', 'î', 'ô', 'û',
];

/// Special characters (0x11 0x30-0x3f and the channel 2 twin).
pub static SPECIAL_CHARS: Lazy<HashMap<u16, char>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for channel in CHANNEL_BITS {
        for (i, ch) in SPECIAL_CHARS_ROW.iter().enumerate() {
            map.insert(word(0x11 | channel, 0x30 + i as u8), *ch);
        }
    }
    map
});

/// Extended character with the ASCII letter decoders fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedChar {
    pub ch: char,
    pub substitute: Option<char>,
}

const EXTENDED_SPANISH_FRENCH: [(char, Option<char>); 32] = [
    ('Á', Some('A')),
    ('É', Some('E')),
    ('Ó', Some('O')),
    ('Ú', Some('U')),
    ('Ü', Some('U')),
    ('ü', Some('u')),
    ('‘', None),
    ('¡', None),
    ('*', None),
    ('’', None),
    ('—', None),
    ('©', None),
    ('℠', None),
    ('•', None),
    ('“', None),
    ('”', None),
    ('À', Some('A')),
    ('Â', Some('A')),
    ('Ç', Some('C')),
    ('È', Some('E')),
    ('Ê', Some('E')),
    ('Ë', Some('E')),
    ('ë', Some('e')),
    ('Î', Some('I')),
    ('Ï', Some('I')),
    ('ï', Some('i')),
    ('Ô', Some('O')),
    ('Ù', Some('U')),
    ('ù', Some('u')),
    ('Û', Some('U')),
    ('«', None),
    ('»', None),
];

const EXTENDED_PORTUGUESE_GERMAN: [(char, Option<char>); 32] = [
    ('Ã', Some('A')),
    ('ã', Some('a')),
    ('Í', Some('I')),
    ('Ì', Some('I')),
    ('ì', Some('i')),
    ('Ò', Some('O')),
    ('ò', Some('o')),
    ('Õ', Some('O')),
    ('õ', Some('o')),
    ('{', None),
    ('}', None),
    ('\\', None),
    ('^', None),
    ('_', None),
    ('|', None),
    ('~', None),
    ('Ä', Some('A')),
    ('ä', Some('a')),
    ('Ö', Some('O')),
    ('ö', Some('o')),
    ('ß', None),
    ('¥', None),
    ('¤', None),
    ('¦', None),
    ('Å', Some('A')),
    ('å', Some('a')),
    ('Ø', None),
    ('ø', None),
    ('┌', None),
    ('┐', None),
    ('└', None),
    ('┘', None),
];

/// Extended characters (0x12/0x13 0x20-0x3f and channel 2 twins).
pub static EXTENDED_CHARS: Lazy<HashMap<u16, ExtendedChar>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for channel in CHANNEL_BITS {
        for (hi, table) in [
            (0x12u8, &EXTENDED_SPANISH_FRENCH),
            (0x13u8, &EXTENDED_PORTUGUESE_GERMAN),
        ] {
            for (i, (ch, substitute)) in table.iter().enumerate() {
                map.insert(
                    word(hi | channel, 0x20 + i as u8),
                    ExtendedChar {
                        ch: *ch,
                        substitute: *substitute,
                    },
                );
            }
        }
    }
    map
});

pub static CHARACTER_TO_CODE: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    CHARACTERS
        .iter()
        .filter_map(|(byte, ch)| ch.map(|c| (c, *byte)))
        .collect()
});

pub static SPECIAL_OR_EXTENDED_CHAR_TO_CODE: Lazy<HashMap<char, u16>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (i, ch) in SPECIAL_CHARS_ROW.iter().enumerate() {
        map.entry(*ch).or_insert(word(0x11, 0x30 + i as u8));
    }
    for (hi, table) in [
        (0x12u8, &EXTENDED_SPANISH_FRENCH),
        (0x13u8, &EXTENDED_PORTUGUESE_GERMAN),
    ] {
        for (i, (ch, _)) in table.iter().enumerate() {
            map.entry(*ch).or_insert(word(hi, 0x20 + i as u8));
        }
    }
    map
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_matches_scc_files() {
        assert_eq!(word(0x14, 0x20), 0x9420);
        assert_eq!(word(0x14, 0x2f), 0x942f);
        assert_eq!(word(0x14, 0x2c), 0x942c);
        assert_eq!(word(0x14, 0x27), 0x94a7);
        assert_eq!(word(0x17, 0x21), 0x97a1);
        assert_eq!(word(0x17, 0x23), 0x9723);
    }

    #[test]
    fn command_table_covers_both_channels_and_fields() {
        assert_eq!(COMMANDS.get(&0x9420), Some(&Command::ResumeCaptionLoading));
        assert_eq!(COMMANDS.get(&0x1c20), Some(&Command::ResumeCaptionLoading));
        assert_eq!(COMMANDS.get(&0x94ad), Some(&Command::CarriageReturn));
        assert_eq!(COMMANDS.get(&0x9425), Some(&Command::RollUp(2)));
        assert_eq!(
            COMMANDS.get(&0x91ae),
            Some(&Command::MidRow {
                italics: true,
                underline: false
            })
        );
        assert_eq!(COMMANDS.len(), 2 * (2 * 16 + 3 + 16));
    }

    #[test]
    fn pac_lookup() {
        let pac = lookup_pac(0x9470).unwrap();
        assert_eq!((pac.row, pac.col), (15, 0));
        let pac = lookup_pac(0x94d0).unwrap();
        assert_eq!((pac.row, pac.col), (14, 0));
        let pac = lookup_pac(0x9152).unwrap();
        assert_eq!((pac.row, pac.col), (1, 4));
        let pac = lookup_pac(0x166e).unwrap();
        assert_eq!(pac.row, 8);
        assert!(pac.italics);
        assert_eq!(lookup_pac(0x10e0), None);
        assert!(PAC_BYTES_TO_POSITIONING.values().map(HashMap::len).sum::<usize>() > 300);
    }

    #[test]
    fn writer_pacs_match_row_table() {
        assert_eq!(pac_word_for_row(15), 0x9470);
        assert_eq!(pac_word_for_row(14), 0x94d0);
        assert_eq!(pac_word_for_row(11), 0x10d0);
        assert_eq!(pac_word_for_row(1), 0x91d0);
    }

    #[test]
    fn characters() {
        assert_eq!(CHARACTERS.get(&0x68), Some(&Some('h')));
        assert_eq!(CHARACTERS.get(&0xe9), Some(&Some('i')));
        assert_eq!(CHARACTERS.get(&0x80), Some(&None));
        assert_eq!(CHARACTERS.get(&0x2a), Some(&Some('á')));
        assert_eq!(CHARACTER_TO_CODE.get(&'c'), Some(&0xe3));
        assert_eq!(SPECIAL_CHARS.get(&0x9137), Some(&'♪'));
        assert_eq!(EXTENDED_CHARS.get(&0x9220).map(|e| e.ch), Some('Á'));
        assert_eq!(SPECIAL_OR_EXTENDED_CHAR_TO_CODE.get(&'£'), Some(&0x91b6));
        assert_eq!(SPECIAL_OR_EXTENDED_CHAR_TO_CODE.get(&'*'), Some(&0x92a8));
    }
}
