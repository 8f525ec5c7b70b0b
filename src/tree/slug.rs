//! Title → path segment normalization.
//!
//! The decoder compares incoming segments against page titles run through
//! [`convert_to_safe_string`]; the encoder side must use the same function.

/// Turn a page title into a URL-safe path segment.
///
/// Lowercases, strips markup, transliterates to ASCII, replaces whitespace,
/// `-`, `+` and `_` runs with `space`, drops anything else that is not an
/// ASCII letter or digit, and trims `space` from both ends.
pub fn convert_to_safe_string(title: &str, space: char) -> String {
    let stripped = strip_tags(&title.to_lowercase());
    let ascii = deunicode::deunicode(&stripped).to_lowercase();

    let mut out = String::with_capacity(ascii.len());
    let mut pending_space = false;
    for c in ascii.chars() {
        if c.is_whitespace() || c == '-' || c == '+' || c == '_' || c == space {
            pending_space = true;
        } else if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(space);
            }
            pending_space = false;
            out.push(c);
        }
    }
    out
}

/// Remove `<...>` markup.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(convert_to_safe_string("About Us", '-'), "about-us");
        assert_eq!(convert_to_safe_string("  News + Events  ", '-'), "news-events");
        assert_eq!(convert_to_safe_string("2015", '-'), "2015");
    }

    #[test]
    fn test_transliteration() {
        assert_eq!(convert_to_safe_string("Über Straße", '-'), "uber-strasse");
        assert_eq!(convert_to_safe_string("Crème brûlée", '_'), "creme_brulee");
    }

    #[test]
    fn test_strips_markup_and_punctuation() {
        assert_eq!(convert_to_safe_string("<b>Hello</b>, World!", '-'), "hello-world");
        assert_eq!(convert_to_safe_string("a -- b__c", '-'), "a-b-c");
        assert_eq!(convert_to_safe_string("!!!", '-'), "");
    }
}
