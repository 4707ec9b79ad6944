use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Medical red flags in English and Hindi, plus explicit mentions of the
    /// national emergency numbers. Number matches use digit boundaries because
    /// `\b` does not separate a digit from adjacent Devanagari text.
    pub static ref EMERGENCY_RE: Regex = Regex::new(
        r"(?i)chest pain|heart attack|can'?t breathe|not breathing|unconscious|heavy bleeding|stroke|seizure|overdose|सीने में दर्द|दिल का दौरा|सांस नहीं|सांस नही|बेहोश|बहुत खून|लकवा|दौरा|अचेत|(?:^|\D)(?:108|112)(?:\D|$)"
    ).expect("emergency pattern is valid");
}

/// Keyword scan only; never touches the network.
pub fn is_emergency(text: &str) -> bool {
    EMERGENCY_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_red_flags_in_english_and_hindi() {
        assert!(is_emergency("chest pain"));
        assert!(is_emergency("My father has CHEST PAIN since morning"));
        assert!(is_emergency("सीने में दर्द"));
        assert!(is_emergency("he is बेहोश"));
        assert!(is_emergency("I can't breathe"));
        assert!(is_emergency("cant breathe"));
    }

    #[test]
    fn detects_emergency_numbers() {
        assert!(is_emergency("108"));
        assert!(is_emergency("should I call 108?"));
        assert!(is_emergency("108 पर कॉल करूँ"));
        assert!(is_emergency("dial 112 now"));
    }

    #[test]
    fn ignores_mild_complaints_and_longer_numbers() {
        assert!(!is_emergency("I have a mild headache"));
        assert!(!is_emergency("clinic near 110801"));
        assert!(!is_emergency("order 1080 grams of rice"));
    }
}
