//! Token-wise comparison of program output against the expected output.

/// Returns true if `observed` matches `expected` token by token.
///
/// Both sides are split on runs of whitespace. With `digits > 0`, a pair of
/// tokens that both parse as floating-point numbers is compared after rounding
/// each to `digits` decimal places; any other pair must be equal as strings.
pub fn matches(observed: &[u8], expected: &str, digits: usize) -> bool {
    let observed = String::from_utf8_lossy(observed);

    let mut obs_tokens = observed.split_whitespace();
    let mut exp_tokens = expected.split_whitespace();
    loop {
        match (obs_tokens.next(), exp_tokens.next()) {
            (None, None) => return true,
            (Some(obs), Some(exp)) if token_matches(obs, exp, digits) => continue,
            _ => return false,
        }
    }
}

fn token_matches(obs: &str, exp: &str, digits: usize) -> bool {
    if digits == 0 {
        return obs == exp;
    }
    match (obs.parse::<f64>(), exp.parse::<f64>()) {
        (Ok(o), Ok(e)) => format!("{:.*}", digits, o) == format!("{:.*}", digits, e),
        _ => obs == exp,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ignores_spacing() {
        assert!(matches(b"  hello\n \t world \n\n", "hello world", 0));
        assert!(matches(b"1 2 3", "1\n2\n3\n", 0));
    }

    #[test]
    fn empty_matches_empty() {
        assert!(matches(b"", "", 0));
        assert!(matches(b" \n\t", "\n", 0));
        assert!(matches(b"", "", 3));
    }

    #[test]
    fn token_count_must_agree() {
        assert!(!matches(b"hello", "hello world", 0));
        assert!(!matches(b"hello world !", "hello world", 0));
        assert!(!matches(b"", "x", 0));
    }

    #[test]
    fn exact_without_digits() {
        assert!(!matches(b"123.0", "123", 0));
        assert!(!matches(b"Hello", "hello", 0));
    }

    #[test]
    fn numeric_with_digits() {
        assert!(matches(b"abc 123.0 -4.5679 2x", "abc 123 -4.567890 2x", 4));
        assert!(!matches(b"-4.5680", "-4.567890", 4));
        assert!(matches(b"0.33", "0.333333", 2));
        assert!(matches(b"1e3", "1000", 1));
    }

    #[test]
    fn non_numeric_tokens_stay_exact_with_digits() {
        assert!(!matches(b"2X", "2x", 4));
        assert!(!matches(b"2.0x", "2x", 4));
        assert!(!matches(b"2", "2x", 4));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        assert!(!matches(&[0xff, 0xfe], "ab", 0));
        assert!(matches(&[b'a', b' ', b'b'], "a b", 0));
    }
}
