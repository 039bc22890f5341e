//! Homoglyph folding.
//!
//! Injection phrases hide behind lookalike characters: fullwidth ASCII,
//! the ideographic space, and Cyrillic/Greek letters that render identically
//! to Latin. Folding runs before the injection regex bank so the bank only
//! has to know ASCII.

/// Replace lookalike characters with their ASCII counterparts.
pub fn fold_homoglyphs(content: &str) -> String {
    content.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        // Fullwidth ASCII block: ！ (U+FF01) through ～ (U+FF5E).
        '\u{FF01}'..='\u{FF5E}' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        // Ideographic space.
        '\u{3000}' => ' ',
        // Cyrillic lookalikes.
        'а' => 'a',
        'е' => 'e',
        'о' => 'o',
        'р' => 'p',
        'с' => 'c',
        'х' => 'x',
        'у' => 'y',
        'і' => 'i',
        'ѕ' => 's',
        'ј' => 'j',
        'А' => 'A',
        'В' => 'B',
        'Е' => 'E',
        'К' => 'K',
        'М' => 'M',
        'Н' => 'H',
        'О' => 'O',
        'Р' => 'P',
        'С' => 'C',
        'Т' => 'T',
        'Х' => 'X',
        // Greek lookalikes.
        'ο' => 'o',
        'ν' => 'v',
        'ρ' => 'p',
        'τ' => 't',
        'υ' => 'u',
        'Α' => 'A',
        'Β' => 'B',
        'Ε' => 'E',
        'Ζ' => 'Z',
        'Η' => 'H',
        'Ι' => 'I',
        'Κ' => 'K',
        'Μ' => 'M',
        'Ν' => 'N',
        'Ο' => 'O',
        'Ρ' => 'P',
        'Τ' => 'T',
        'Υ' => 'Y',
        'Χ' => 'X',
        _ => c,
    }
}
