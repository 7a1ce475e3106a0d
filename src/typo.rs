use rand::Rng;
use serde::Serialize;

/// Neighbouring keys on a US-QWERTY layout for a lowercase ASCII letter.
fn qwerty_neighbors(base: char) -> Option<&'static [char]> {
    let neighbors: &'static [char] = match base {
        'a' => &['q', 'w', 's', 'z'],
        'b' => &['v', 'g', 'h', 'n'],
        'c' => &['x', 'd', 'f', 'v'],
        'd' => &['e', 'r', 's', 'f', 'c', 'x'],
        'e' => &['w', 's', 'd', 'r'],
        'f' => &['r', 't', 'g', 'd', 'v', 'c'],
        'g' => &['t', 'y', 'f', 'h', 'v', 'b'],
        'h' => &['y', 'u', 'g', 'j', 'n', 'b'],
        'i' => &['u', 'j', 'k', 'o'],
        'j' => &['u', 'i', 'k', 'h', 'm', 'n'],
        'k' => &['i', 'j', 'o', 'l', 'm'],
        'l' => &['k', 'o', 'p'],
        'm' => &['n', 'j', 'k'],
        'n' => &['b', 'h', 'j', 'm'],
        'o' => &['i', 'k', 'l', 'p'],
        'p' => &['o', 'l'],
        'q' => &['w', 'a'],
        'r' => &['e', 'd', 'f', 't'],
        's' => &['w', 'e', 'd', 'x', 'z', 'a'],
        't' => &['r', 'f', 'g', 'y'],
        'u' => &['y', 'h', 'j', 'i'],
        'v' => &['c', 'f', 'g', 'b'],
        'w' => &['q', 'a', 's', 'e'],
        'x' => &['z', 's', 'd', 'c'],
        'y' => &['t', 'g', 'h', 'u'],
        'z' => &['a', 's', 'x'],
        _ => return None,
    };
    Some(neighbors)
}

/// Pick a key adjacent to `c`, preserving case.
///
/// Only the 52 ASCII Latin letters have neighbours; everything else returns `None`.
pub fn qwerty_adjacent_char(c: char, rng: &mut impl Rng) -> Option<char> {
    if !c.is_ascii_alphabetic() {
        return None;
    }

    let make_upper = c.is_ascii_uppercase();
    let neighbors = qwerty_neighbors(c.to_ascii_lowercase())?;

    let chosen = neighbors[rng.gen_range(0..neighbors.len())];
    Some(if make_upper {
        chosen.to_ascii_uppercase()
    } else {
        chosen
    })
}

/// Replace one uniformly chosen character of `word` with an adjacent key.
///
/// Words shorter than two characters come back unchanged. When the chosen
/// character has no neighbours the result equals the input.
pub fn make_typo(word: &str, rng: &mut impl Rng) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    if chars.len() < 2 {
        return word.to_string();
    }

    let idx = rng.gen_range(0..chars.len());
    if let Some(adj) = qwerty_adjacent_char(chars[idx], rng) {
        chars[idx] = adj;
    }
    chars.into_iter().collect()
}

/// Result of rolling for a typo on one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypoOutcome {
    /// What the typist visibly typed first.
    pub display: String,
    /// Whether a typo roll fired. The display may still equal the word when the
    /// chosen character has no neighbours.
    pub is_typo: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TypoModel {
    pub rate: f64,
    /// Words must be at least this many characters long to receive a typo.
    pub min_word_chars: usize,
}

impl Default for TypoModel {
    fn default() -> Self {
        Self {
            rate: 1.0 / 20.0,
            min_word_chars: 4,
        }
    }
}

impl TypoModel {
    pub fn maybe_typo(&self, word: &str, rng: &mut impl Rng) -> TypoOutcome {
        let len = word.chars().count();
        if len < 2 || len < self.min_word_chars || !rng.gen_bool(self.rate.clamp(0.0, 1.0)) {
            return TypoOutcome {
                display: word.to_string(),
                is_typo: false,
            };
        }

        TypoOutcome {
            display: make_typo(word, rng),
            is_typo: true,
        }
    }
}
