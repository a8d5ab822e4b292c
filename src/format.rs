//! Display helpers for names, phones and optional classification fields.

/// Label shown for classification fields that were left blank.
pub const NOT_DEFINED: &str = "Não definido";

/// Return `s`, or the "not defined" label when it is empty or blank.
pub fn or_not_defined(s: &str) -> &str {
    if s.trim().is_empty() { NOT_DEFINED } else { s }
}

/// Format a Brazilian phone number.
///
/// 11 digits become `(DD) NNNNN-NNNN`, 10 digits `(DD) NNNN-NNNN`. Any other
/// input is returned trimmed and otherwise untouched.
pub fn format_phone(s: &str) -> String {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => s.trim().to_string(),
    }
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Capitalize each whitespace-separated word, collapsing runs of whitespace.
pub fn capitalize_words(s: &str) -> String {
    s.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_formats() {
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("(11) 3456-7890"), "(11) 3456-7890");
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone(" 12345 "), "12345");
        assert_eq!(format_phone(""), "");
    }

    #[test]
    fn capitalization() {
        assert_eq!(capitalize("eLÉTRICA"), "Elétrica");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize_words("  joão   da silva "), "João Da Silva");
    }

    #[test]
    fn blank_fields_show_label() {
        assert_eq!(or_not_defined(""), NOT_DEFINED);
        assert_eq!(or_not_defined("   "), NOT_DEFINED);
        assert_eq!(or_not_defined("Civil"), "Civil");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("Alvenaria", 20), "Alvenaria");
        assert_eq!(truncate("Alvenaria bloco 3", 6), "Alven…");
    }
}
