use super::constants::{
    lookup_pac, Command, ExtendedChar, Pac, CHARACTERS, COMMANDS, EXTENDED_CHARS, SPECIAL_CHARS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Command(Command),
    Pac(Pac),
    Special(char),
    Extended(ExtendedChar),
    Chars(String),
}

impl Token {
    fn is_special_or_extended(&self) -> bool {
        matches!(self, Token::Special(_) | Token::Extended(_))
    }
}

pub fn parse_word(s: &str) -> Option<u16> {
    if s.len() != 4 {
        return None;
    }
    u16::from_str_radix(s, 16).ok()
}

pub fn classify(word: u16) -> Option<Token> {
    if let Some(cmd) = COMMANDS.get(&word) {
        return Some(Token::Command(*cmd));
    }
    if let Some(pac) = lookup_pac(word) {
        return Some(Token::Pac(pac));
    }
    if let Some(ch) = SPECIAL_CHARS.get(&word) {
        return Some(Token::Special(*ch));
    }
    if let Some(ext) = EXTENDED_CHARS.get(&word) {
        return Some(Token::Extended(*ext));
    }

    let [hi, lo] = word.to_be_bytes();
    let first = CHARACTERS.get(&hi)?;
    let second = CHARACTERS.get(&lo)?;
    let text: String = first.iter().chain(second.iter()).collect();
    Some(Token::Chars(text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebouncePolicy {
    #[default]
    CommandsAndCharacters,
    CommandsOnly,
}

/// Drops the second copy of words that broadcasters send twice.
///
/// Plain `9420 9420` pairs are collapsed, and so are the interleaved
/// `PAC TO PAC TO` and `PAC PAC TO TO` forms of a PAC followed by a tab
/// offset.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    policy: DebouncePolicy,
    recent: Vec<u16>,
}

impl Debouncer {
    pub fn new(policy: DebouncePolicy) -> Self {
        Self {
            policy,
            recent: Vec::new(),
        }
    }

    fn participates(&self, token: &Token) -> bool {
        match token {
            Token::Command(_) | Token::Pac(_) => true,
            t if t.is_special_or_extended() => {
                self.policy == DebouncePolicy::CommandsAndCharacters
            }
            _ => false,
        }
    }

    pub fn accept(&mut self, word: u16, token: &Token) -> bool {
        if !self.participates(token) {
            self.recent.clear();
            return true;
        }

        if let Some(pos) = self.recent.iter().position(|w| *w == word) {
            self.recent.drain(..=pos);
            return false;
        }

        let follows_pac = self
            .recent
            .first()
            .is_some_and(|w| lookup_pac(*w).is_some());
        if matches!(token, Token::Command(Command::TabOffset(_))) && follows_pac {
            self.recent.push(word);
        } else {
            self.recent = vec![word];
        }
        true
    }
}
