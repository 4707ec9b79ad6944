use lazy_static::lazy_static;
use regex::Regex;

use crate::models::nearby::FacilityKind;

// Proximity phrases shared by both keyword sets. Bare "पास" is left out: it
// also means "have" in everyday Hindi.
const PROXIMITY_TERMS: &str =
    r"near\s*me|nearby|nearest|close\s*by|paas\s*m(?:ein|e)|aas\s*paas|najdeek|nazdeek|पास\s*में|आसपास|आस\s*पास|नजदीक|नज़दीक|नजदीकी|जवळ|जवळच्या|அருகில்|దగ్గర|సమీప|ಹತ್ತಿರ|কাছে|কাছাকাছি|નજીક|પાસે";

lazy_static! {
    static ref FACILITY_RE: Regex = Regex::new(
        &format!(
            r"(?i){}|\b(?:clinics?|pharmac(?:y|ies)|hospitals?|chemists?|dispensar(?:y|ies)|medical\s+(?:store|shop)s?|health\s+cent(?:re|er)s?|dawakhana|aspatal)\b|क्लीनिक|फार्मेसी|अस्पताल|दवाखाना|केमिस्ट|मेडिकल",
            PROXIMITY_TERMS
        )
    ).expect("facility pattern is valid");

    static ref SHOP_RE: Regex = Regex::new(
        &format!(r"(?i){}|\b(?:shops?|stores?|kirana|dukaa?n)\b|दुकान|किराना|स्टोर", PROXIMITY_TERMS)
    ).expect("shop pattern is valid");

    static ref CLINIC_RE: Regex = Regex::new(
        r"(?i)\b(?:clinics?|doctors?|dispensar(?:y|ies)|dawakhana)\b|क्लीनिक|दवाखाना|डॉक्टर"
    ).expect("clinic pattern is valid");

    static ref PHARMACY_RE: Regex = Regex::new(
        r"(?i)\b(?:pharmac(?:y|ies)|chemists?|(?:medical|medicine)\s+(?:store|shop)s?)\b|फार्मेसी|केमिस्ट|मेडिकल\s*स्टोर|दवा\s*की\s*दुकान"
    ).expect("pharmacy pattern is valid");

    static ref HOSPITAL_RE: Regex = Regex::new(
        r"(?i)\b(?:hospitals?|aspatal)\b|अस्पताल"
    ).expect("hospital pattern is valid");

    static ref SHOP_MENTION_RE: Regex = Regex::new(
        r"(?i)\b(?:shops?|stores?|kirana|dukaa?n)\b|दुकान|किराना|स्टोर"
    ).expect("shop mention pattern is valid");

    static ref PINCODE_IN_TEXT_RE: Regex = Regex::new(r"(?:^|[^0-9])([0-9]{6})(?:[^0-9]|$)").expect(
        "pincode pattern is valid"
    );
}

pub(crate) fn warm_up() {
    lazy_static::initialize(&FACILITY_RE);
    lazy_static::initialize(&SHOP_RE);
    lazy_static::initialize(&CLINIC_RE);
    lazy_static::initialize(&PHARMACY_RE);
    lazy_static::initialize(&HOSPITAL_RE);
    lazy_static::initialize(&SHOP_MENTION_RE);
    lazy_static::initialize(&PINCODE_IN_TEXT_RE);
}

pub fn is_valid_pincode(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NearbyQuery {
    pub pincode: String,
    pub kind: FacilityKind,
}

#[derive(Clone, Debug)]
pub struct NearbyQueryDetector {
    default_pincode: String,
}

impl NearbyQueryDetector {
    pub fn new(default_pincode: impl Into<String>) -> Self {
        Self { default_pincode: default_pincode.into() }
    }

    pub fn default_pincode(&self) -> &str {
        &self.default_pincode
    }

    /// Returns `None` when the text is not a nearby question at all.
    pub fn detect_kind(&self, text: &str) -> Option<FacilityKind> {
        let facility = FACILITY_RE.is_match(text);
        let shop = SHOP_RE.is_match(text);
        if !facility && !shop {
            return None;
        }

        let kind = if CLINIC_RE.is_match(text) {
            FacilityKind::Clinic
        } else if PHARMACY_RE.is_match(text) {
            FacilityKind::Pharmacy
        } else if HOSPITAL_RE.is_match(text) {
            FacilityKind::Hospital
        } else if SHOP_MENTION_RE.is_match(text) {
            FacilityKind::Shops
        } else if facility && !shop {
            FacilityKind::Facilities
        } else {
            FacilityKind::Shops
        };
        Some(kind)
    }

    /// Body value, then a 6-digit number in the text, then the saved
    /// pincode, then the configured default. Invalid values are skipped.
    pub fn resolve_pincode(
        &self,
        text: &str,
        body_pincode: Option<&str>,
        saved_pincode: Option<&str>
    ) -> String {
        if let Some(pin) = body_pincode.map(str::trim).filter(|p| is_valid_pincode(p)) {
            return pin.to_string();
        }
        if let Some(caps) = PINCODE_IN_TEXT_RE.captures(text) {
            return caps[1].to_string();
        }
        if let Some(pin) = saved_pincode.map(str::trim).filter(|p| is_valid_pincode(p)) {
            return pin.to_string();
        }
        self.default_pincode.clone()
    }

    pub fn detect(
        &self,
        text: &str,
        body_pincode: Option<&str>,
        saved_pincode: Option<&str>
    ) -> Option<NearbyQuery> {
        let kind = self.detect_kind(text)?;
        Some(NearbyQuery {
            pincode: self.resolve_pincode(text, body_pincode, saved_pincode),
            kind,
        })
    }
}
