//! The log grammar view getters write to.
//!
//! A single value is logged as `<label>: <v>` or `<label>: (<v>)`, a pair as
//! `<label>: (<v0>, <v1>)`. Each value is either bare digits or a tagged
//! scalar such as `U64(123)`. A label matches anywhere in a line, ignoring
//! case, and the first matching line wins.

use {
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    regex::Regex,
    std::sync::OnceLock,
};

const TAGGED_SCALAR: &str = r"[A-Za-z]\w*\(\d+\)";

fn label_pattern(label: &str, tail: &str) -> HarnessResult<Regex> {
    Regex::new(&format!(r"(?i){}:\s*{}", regex::escape(label), tail))
        .map_err(|err| HarnessError::InvalidViewQuery(err.to_string()))
}

fn first_captures<'l>(pattern: &Regex, logs: &'l [String]) -> Option<regex::Captures<'l>> {
    logs.iter().find_map(|line| pattern.captures(line))
}

/// Find the first single value logged for `label`.
pub fn find_single(logs: &[String], label: &str) -> HarnessResult<Option<String>> {
    let pattern = label_pattern(label, &format!(r"\(?\s*({TAGGED_SCALAR}|\d+)"))?;
    Ok(first_captures(&pattern, logs).map(|caps| caps[1].to_string()))
}

/// Find the first value pair logged for `label`.
///
/// The first pass stops the second capture at the first `)`, which cuts a
/// tagged second value short (`U64(456`). When that happens the same lines
/// are scanned again with a pattern that requires the full tag in second
/// position.
pub fn find_pair(logs: &[String], label: &str) -> HarnessResult<Option<(String, String)>> {
    let pattern = label_pattern(label, r"\(([^,]+),\s*([^)]+)\)")?;
    let Some(caps) = first_captures(&pattern, logs) else {
        return Ok(None);
    };
    let first = caps[1].trim().to_string();
    let mut second = caps[2].trim().to_string();

    if !second.contains(')') {
        let repair = label_pattern(label, &format!(r"\([^,]+,\s*({TAGGED_SCALAR})\)"))?;
        if let Some(repaired) = first_captures(&repair, logs) {
            log::trace!("Repaired truncated capture {:?} for {}", second, label);
            second = repaired[1].to_string();
        }
    }
    Ok(Some((first, second)))
}

/// Pull the digit run out of a captured value: the payload of a tagged
/// scalar, or the value itself when it is bare digits. Anything else is `"0"`.
pub fn extract_digits(capture: &str) -> String {
    static TAGGED: OnceLock<Regex> = OnceLock::new();
    static BARE: OnceLock<Regex> = OnceLock::new();

    let tagged = TAGGED.get_or_init(|| Regex::new(r"[A-Za-z]\w*\((\d+)\)").unwrap());
    if let Some(caps) = tagged.captures(capture) {
        return caps[1].to_string();
    }
    let bare = BARE.get_or_init(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());
    bare.captures(capture)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_single_forms() {
        for line in [
            "Program log: emaPrice0Nad: 1000000000",
            "Program log: EmaPrice0Nad: (1000000000)",
            "Program log: EMAPRICE0NAD: U128(1000000000)",
        ] {
            let capture = find_single(&lines(&[line]), "emaPrice0Nad").unwrap().unwrap();
            assert_eq!(extract_digits(&capture), "1000000000");
        }
    }

    #[test]
    fn test_first_matching_line_wins() {
        let logs = lines(&[
            "Program omnipair invoke [1]",
            "Program log: k: 10",
            "Program log: k: 20",
        ]);
        assert_eq!(find_single(&logs, "k").unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn test_label_matches_as_substring() {
        let logs = lines(&["Program log: xFoo: 5", "Program log: Foo: 6"]);
        assert_eq!(find_single(&logs, "Foo").unwrap().as_deref(), Some("5"));

        let logs = lines(&["Program log: pool_Foo: (U64(1), U64(2))"]);
        let (first, second) = find_pair(&logs, "Foo").unwrap().unwrap();
        assert_eq!(extract_digits(&first), "1");
        assert_eq!(extract_digits(&second), "2");

        let logs = lines(&["Program log: spotPrice0Nad: 7"]);
        assert_eq!(find_single(&logs, "Price0Nad").unwrap().as_deref(), Some("7"));
    }

    #[test]
    fn test_pair_repairs_truncated_tag() {
        let logs = lines(&["Program log: Foo: (U64(123), U64(456))"]);
        let (first, second) = find_pair(&logs, "Foo").unwrap().unwrap();
        assert_eq!(first, "U64(123)");
        assert_eq!(second, "U64(456)");
    }

    #[test]
    fn test_pair_bare_values() {
        let logs = lines(&["Program log: getRates: (120, 340)"]);
        let (first, second) = find_pair(&logs, "getRates").unwrap().unwrap();
        assert_eq!(extract_digits(&first), "120");
        assert_eq!(extract_digits(&second), "340");
    }

    #[test]
    fn test_extract_digits() {
        assert_eq!(extract_digits("U16(500)"), "500");
        assert_eq!(extract_digits(" 42 "), "42");
        assert_eq!(extract_digits("None"), "0");
        assert_eq!(extract_digits("U64(456"), "0");
    }
}
