//! Victim descent code table.

/// Label shown for codes missing from the table.
pub const UNKNOWN: &str = "Unknown";

/// Map a single-letter victim descent code to a readable label.
pub fn ethnicity_label(code: &str) -> &'static str {
    match code.trim().to_ascii_uppercase().as_str() {
        "A" => "Other Asian",
        "B" => "Black",
        "C" => "Chinese",
        "D" => "Cambodian",
        "F" => "Filipino",
        "G" => "Guamanian",
        "H" => "Hispanic/Latino",
        "I" => "American Indian/Alaskan Native",
        "J" => "Japanese",
        "K" => "Korean",
        "L" => "Laotian",
        "O" => "Other",
        "P" => "Pacific Islander",
        "S" => "Samoan",
        "U" => "Hawaiian",
        "V" => "Vietnamese",
        "W" => "White",
        "Z" => "Asian Indian",
        _ => UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_codes() {
        assert_eq!(ethnicity_label("H"), "Hispanic/Latino");
        assert_eq!(ethnicity_label("w"), "White");
        assert_eq!(ethnicity_label("Q"), UNKNOWN);
        assert_eq!(ethnicity_label("X"), UNKNOWN);
        assert_eq!(ethnicity_label(""), UNKNOWN);
    }
}
