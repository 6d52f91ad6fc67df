//! Text cleanup.

/// Title case with word boundaries at every non-alphabetic character.
///
/// ```
/// use bhd_transform::normalization::title_case;
///
/// assert_eq!(title_case("SAN ANDREAS"), "San Andreas");
/// assert_eq!(title_case("mokelumne hill"), "Mokelumne Hill");
/// assert_eq!(title_case("o'neil-smith"), "O'Neil-Smith");
/// ```
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                // Multi-char uppercase forms ("ß" -> "SS") keep only the first upper.
                let mut upper = ch.to_uppercase();
                out.extend(upper.next());
                out.extend(upper.flat_map(char::to_lowercase));
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Remove every trailing occurrence of `suffix`.
pub fn strip_suffix(value: &str, suffix: char) -> String {
    value.trim_end().trim_end_matches(suffix).to_string()
}

pub fn remove_char(value: &str, ch: char) -> String {
    value.chars().filter(|c| *c != ch).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_lowercases_the_tail() {
        assert_eq!(title_case("CALAVERAS"), "Calaveras");
        assert_eq!(title_case("calaveras county"), "Calaveras County");
        assert_eq!(title_case("2nd street"), "2Nd Street");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn title_case_is_idempotent() {
        for value in ["VALLEY SPRINGS", "angels camp", "McDonald", "x-y z", "straße"] {
            let once = title_case(value);
            assert_eq!(title_case(&once), once);
        }
    }

    #[test]
    fn strips_suffix_and_chars() {
        assert_eq!(strip_suffix("45.2%", '%'), "45.2");
        assert_eq!(strip_suffix("45.2%% ", '%'), "45.2");
        assert_eq!(strip_suffix("45.2", '%'), "45.2");
        assert_eq!(remove_char("1,234,567", ','), "1234567");
    }
}
