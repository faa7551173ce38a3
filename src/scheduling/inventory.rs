//! Inventory number formatting: `{PREFIX}-{NNNN}`

/// Prefix used when the type name is blank
pub const DEFAULT_PREFIX: &str = "EQP";

const PREFIX_LEN: usize = 3;

/// Latin spelling of a Cyrillic letter, `None` for anything else
#[rustfmt::skip]
fn latin_for(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a", 'б' => "b", 'в' => "v", 'г' => "g", 'д' => "d",
        'е' => "e", 'ё' => "e", 'ж' => "zh", 'з' => "z", 'и' => "i",
        'й' => "y", 'к' => "k", 'л' => "l", 'м' => "m", 'н' => "n",
        'о' => "o", 'п' => "p", 'р' => "r", 'с' => "s", 'т' => "t",
        'у' => "u", 'ф' => "f", 'х' => "h", 'ц' => "ts", 'ч' => "ch",
        'ш' => "sh", 'щ' => "sch", 'ъ' => "", 'ы' => "y", 'ь' => "",
        'э' => "e", 'ю' => "yu", 'я' => "ya",
        'А' => "A", 'Б' => "B", 'В' => "V", 'Г' => "G", 'Д' => "D",
        'Е' => "E", 'Ё' => "E", 'Ж' => "Zh", 'З' => "Z", 'И' => "I",
        'Й' => "Y", 'К' => "K", 'Л' => "L", 'М' => "M", 'Н' => "N",
        'О' => "O", 'П' => "P", 'Р' => "R", 'С' => "S", 'Т' => "T",
        'У' => "U", 'Ф' => "F", 'Х' => "H", 'Ц' => "Ts", 'Ч' => "Ch",
        'Ш' => "Sh", 'Щ' => "Sch", 'Ъ' => "", 'Ы' => "Y", 'Ь' => "",
        'Э' => "E", 'Ю' => "Yu", 'Я' => "Ya",
        _ => return None,
    };
    Some(latin)
}

/// Transliterate Cyrillic letters to Latin; other characters pass through
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match latin_for(c) {
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

/// Three-letter uppercase prefix derived from an equipment type name
pub fn prefix(type_name: &str) -> String {
    if type_name.trim().is_empty() {
        return DEFAULT_PREFIX.to_string();
    }

    // Some letters uppercase to several, so the cut comes after uppercasing
    let mut prefix: String = transliterate(type_name)
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .take(PREFIX_LEN)
        .collect();

    while prefix.chars().count() < PREFIX_LEN {
        prefix.push('X');
    }
    prefix
}

/// Format the inventory number for the `sequence`-th item of a type (1-based)
pub fn format_number(prefix: &str, sequence: i64) -> String {
    format!("{}-{:04}", prefix, sequence)
}

/// Inventory number following `existing` items of the same type
pub fn next_number(prefix: &str, existing: i64) -> String {
    format_number(prefix, existing + 1)
}
