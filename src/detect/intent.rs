use lazy_static::lazy_static;
use regex::Regex;

use crate::models::chat::Intent;

lazy_static! {
    pub static ref HEALTH_INTENT_RE: Regex = Regex::new(
        r"(?i)\b(?:fever\w*|cough\w*|cold|pain\w*|ache\w*|headache\w*|stomach\w*|vomit\w*|diarr\w*|bleed\w*|rash\w*|swel\w*|breath\w*|doctor\w*|hospital\w*|clinic\w*|medicine\w*|tablet\w*|capsule\w*|injection\w*|disease\w*|ill|illness|sick\w*|बुखार|खाँसी|खांसी|जुकाम|दर्द|सिरदर्द|पेट|उल्टी|दस्त|खून|सूजन|सांस|डॉक्टर|अस्पताल|क्लीनिक|दवा|बीमारी|तबियत)\b"
    ).expect("health intent pattern is valid");

    pub static ref RETAIL_INTENT_RE: Regex = Regex::new(
        r"(?i)\b(?:buy\w*|order\w*|shop\w*|price\w*|cost\w*|stock\w*|deliver\w*|milk|rice|wheat|vegetables?|grocer\w*|rupees?|kg|kilo\w*|liter\w*|litre\w*|packets?|bottles?|खरीद\w*|ऑर्डर|दुकान|कीमत|सस्ता|महंगा|दूध|चावल|गेहूं|सब्जी|राशन|किलो|लीटर)\b"
    ).expect("retail intent pattern is valid");
}

/// Keyword fast path. `None` means both or neither domain matched and the
/// caller has to ask the model.
pub fn classify_fast(text: &str) -> Option<Intent> {
    let health = HEALTH_INTENT_RE.is_match(text);
    let retail = RETAIL_INTENT_RE.is_match(text);
    match (health, retail) {
        (true, false) => Some(Intent::Health),
        (false, true) => Some(Intent::Retail),
        _ => None,
    }
}
