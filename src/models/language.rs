pub const SUPPORTED_LANGUAGES: [&str; 8] = ["hi", "en", "mr", "ta", "te", "kn", "bn", "gu"];
pub const FALLBACK_LANGUAGE: &str = "en";

pub fn is_supported(language: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&language)
}
