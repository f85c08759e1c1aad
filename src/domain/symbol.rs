/// Sequence symbols and raw key input.
///
/// The easter-egg sequence is a closed set of symbols. Raw characters are
/// normalized to uppercase before they are compared against it.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Symbol {
    Z,
    E,
    N,
    I,
    T,
    H,
    One,
}

/// The sequence that unlocks zero-gravity mode.
pub const TARGET_SEQUENCE: [Symbol; 7] = [
    Symbol::Z,
    Symbol::E,
    Symbol::N,
    Symbol::I,
    Symbol::T,
    Symbol::H,
    Symbol::One,
];

/// Characters that neither advance nor reset sequence progress.
pub const IGNORED_INPUTS: [char; 3] = [' ', '-', '_'];

impl Symbol {
    /// Case-insensitive lookup. Returns None for characters outside the set.
    pub fn from_char(c: char) -> Option<Symbol> {
        match c.to_ascii_uppercase() {
            'Z' => Some(Symbol::Z),
            'E' => Some(Symbol::E),
            'N' => Some(Symbol::N),
            'I' => Some(Symbol::I),
            'T' => Some(Symbol::T),
            'H' => Some(Symbol::H),
            '1' => Some(Symbol::One),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::Z => 'Z',
            Symbol::E => 'E',
            Symbol::N => 'N',
            Symbol::I => 'I',
            Symbol::T => 'T',
            Symbol::H => 'H',
            Symbol::One => '1',
        }
    }
}

pub fn is_ignored(c: char) -> bool {
    IGNORED_INPUTS.contains(&c)
}

/// One unit of keyboard input as seen by the sequence detector.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyInput {
    Char(char),
    /// Escape. Handled ahead of any symbol matching.
    Cancel,
}
