//! International Morse code symbol table.

/// Every decodable symbol with its code, `.` for dit and `-` for dah.
pub const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('0', "-----"),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('!', "-.-.--"),
    (':', "---..."),
    ('"', ".-..-."),
    ('\'', ".----."),
    ('=', "-...-"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (';', "-.-.-."),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('$', "...-..-"),
    ('@', ".--.-."),
];

pub const DIT: char = '.';
pub const DAH: char = '-';

/// Code for `symbol`, case-insensitive for letters.
pub fn encode(symbol: char) -> Option<&'static str> {
    let symbol = symbol.to_ascii_uppercase();
    MORSE_TABLE
        .iter()
        .find(|(c, _)| *c == symbol)
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_has_no_duplicates() {
        let symbols: HashSet<char> = MORSE_TABLE.iter().map(|(c, _)| *c).collect();
        let codes: HashSet<&str> = MORSE_TABLE.iter().map(|(_, code)| *code).collect();
        assert_eq!(symbols.len(), MORSE_TABLE.len());
        assert_eq!(codes.len(), MORSE_TABLE.len());
    }

    #[test]
    fn test_codes_only_use_dits_and_dahs() {
        for (symbol, code) in MORSE_TABLE {
            assert!(!code.is_empty(), "{} has an empty code", symbol);
            assert!(code.chars().all(|c| c == DIT || c == DAH), "{}", symbol);
        }
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode('s'), Some("..."));
        assert_eq!(encode('?'), Some("..--.."));
        assert_eq!(encode('#'), None);
    }
}
