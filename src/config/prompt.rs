use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use thiserror::Error;

use crate::error::BoxError;
use crate::models::language::FALLBACK_LANGUAGE;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template '{0}' not found")]
    TemplateNotFound(String),
    #[error("Prompt file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Localized pieces of a nearby-search reply.
#[derive(Deserialize, Debug, Clone)]
pub struct NearbyTemplate {
    /// `{kind}` and `{location}` are substituted.
    pub found_header: String,
    pub not_found: String,
    pub your_location: String,
    /// `{pincode}` is substituted.
    pub pincode_location: String,
    pub kinds: HashMap<String, String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PromptConfig {
    pub system_base: String,
    pub language_directives: HashMap<String, String>,
    pub health_extra: String,
    pub emergency_messages: HashMap<String, String>,
    pub emergency_fallback: String,
    pub query_templates: HashMap<String, String>,
    pub nearby_templates: HashMap<String, NearbyTemplate>,
}

fn string_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for PromptConfig {
    fn default() -> Self {
        let language_directives = string_map(
            &[
                ("hi", "IMPORTANT: Reply ONLY in Hindi (हिंदी). Use Devanagari script."),
                ("en", "IMPORTANT: Reply ONLY in English."),
                ("mr", "IMPORTANT: Reply ONLY in Marathi (मराठी)."),
                ("ta", "IMPORTANT: Reply ONLY in Tamil (தமிழ்)."),
                ("te", "IMPORTANT: Reply ONLY in Telugu (తెలుగు)."),
                ("kn", "IMPORTANT: Reply ONLY in Kannada (ಕನ್ನಡ)."),
                ("bn", "IMPORTANT: Reply ONLY in Bengali (বাংলা)."),
                ("gu", "IMPORTANT: Reply ONLY in Gujarati (ગુજરાતી)."),
            ]
        );

        let emergency_messages = string_map(
            &[
                ("hi", "⚠️ यह गंभीर स्थिति लग रही है। कृपया तुरंत नजदीकी अस्पताल जाएं या 108 पर कॉल करें।"),
                ("en", "⚠️ This appears to be an emergency. Please call 108 or go to the nearest hospital immediately."),
                ("mr", "⚠️ ही गंभीर परिस्थिती वाटते. कृपया त्वरित नजीकच्या रुग्णालयात जा किंवा 108 वर कॉल करा."),
                ("ta", "⚠️ இது அவசரநிலை போல் தெரிகிறது. 108 அழைக்கவும் அல்லது அருகிலுள்ள மருத்துவமனைக்கு உடனடியாக செல்லுங்கள்."),
                ("te", "⚠️ ఇది అత్యవసర పరిస్థితిగా కనిపిస్తోంది. 108 కు కాల్ చేయండి లేదా సమీప ఆసుపత్రికి వెంటనే వెళ్లండి."),
                ("kn", "⚠️ ಇದು ತುರ್ತು ಪರಿಸ್ಥಿತಿಯಂತೆ ಕಾಣುತ್ತದೆ. 108 ಕ್ಕೆ ಕರೆ ಮಾಡಿ ಅಥವಾ ಹತ್ತಿರದ ಆಸ್ಪತ್ರೆಗೆ ತಕ್ಷಣ ಹೋಗಿ."),
                ("bn", "⚠️ এটি জরুরি পরিস্থিতির মতো মনে হচ্ছে। 108 এ কল করুন বা নিকটতম হাসপাতালে যান।"),
                ("gu", "⚠️ આ ગંભીર પરિસ્થિતિ લાગે છે. કૃપા કરીને તરત નજીકની હોસ્પિટલ જાઓ અથવા 108 પર કૉલ કરો."),
            ]
        );

        let query_templates = string_map(
            &[
                (
                    "intent_classification",
                    "Classify into exactly one word (health/retail/info/unknown):\nQuery: {message}",
                ),
                (
                    "location_extraction",
                    "Extract the location from this query. Reply ONLY with valid JSON: {\"location\": \"<city>\"} or {\"location\": null}\nQuery: {message}",
                ),
                (
                    "doctor_summary",
                    "Write a brief doctor-ready summary (under 120 words).\nSymptoms: {symptoms}\nContext: {context}\n\nFormat: Chief Complaint | Symptoms | Duration | Notes",
                ),
            ]
        );

        let mut nearby_templates = HashMap::new();
        nearby_templates.insert("hi".to_string(), NearbyTemplate {
            found_header: "{location} के पास {kind}:".to_string(),
            not_found: "माफ़ करें, {location} के पास कोई {kind} नहीं मिला। कृपया अपना पिनकोड बताएं।".to_string(),
            your_location: "आपके स्थान".to_string(),
            pincode_location: "पिनकोड {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "क्लीनिक"),
                    ("pharmacy", "फार्मेसी"),
                    ("hospital", "अस्पताल"),
                    ("facilities", "स्वास्थ्य केंद्र"),
                    ("shops", "दुकानें"),
                ]
            ),
        });
        nearby_templates.insert("en".to_string(), NearbyTemplate {
            found_header: "{kind} near {location}:".to_string(),
            not_found: "Sorry, no {kind} found near {location}. Please share your pincode.".to_string(),
            your_location: "your location".to_string(),
            pincode_location: "pincode {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "Clinics"),
                    ("pharmacy", "Pharmacies"),
                    ("hospital", "Hospitals"),
                    ("facilities", "Health facilities"),
                    ("shops", "Shops"),
                ]
            ),
        });

        nearby_templates.insert("mr".to_string(), NearbyTemplate {
            found_header: "{location} जवळील {kind}:".to_string(),
            not_found: "माफ करा, {location} जवळ कोणतेही {kind} सापडले नाही. कृपया तुमचा पिनकोड सांगा.".to_string(),
            your_location: "तुमच्या ठिकाणा".to_string(),
            pincode_location: "पिनकोड {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "दवाखाने"),
                    ("pharmacy", "औषध दुकाने"),
                    ("hospital", "रुग्णालये"),
                    ("facilities", "आरोग्य केंद्रे"),
                    ("shops", "दुकाने"),
                ]
            ),
        });
        nearby_templates.insert("ta".to_string(), NearbyTemplate {
            found_header: "{location} அருகில் உள்ள {kind}:".to_string(),
            not_found: "மன்னிக்கவும், {location} அருகில் {kind} எதுவும் கிடைக்கவில்லை. உங்கள் பின்கோடைத் தெரிவிக்கவும்.".to_string(),
            your_location: "உங்கள் இருப்பிடம்".to_string(),
            pincode_location: "பின்கோடு {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "கிளினிக்குகள்"),
                    ("pharmacy", "மருந்தகங்கள்"),
                    ("hospital", "மருத்துவமனைகள்"),
                    ("facilities", "சுகாதார நிலையங்கள்"),
                    ("shops", "கடைகள்"),
                ]
            ),
        });
        nearby_templates.insert("te".to_string(), NearbyTemplate {
            found_header: "{location} సమీపంలోని {kind}:".to_string(),
            not_found: "క్షమించండి, {location} సమీపంలో {kind} ఏవీ కనబడలేదు. దయచేసి మీ పిన్‌కోడ్ చెప్పండి.".to_string(),
            your_location: "మీ ప్రాంతం".to_string(),
            pincode_location: "పిన్‌కోడ్ {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "క్లినిక్‌లు"),
                    ("pharmacy", "మందుల దుకాణాలు"),
                    ("hospital", "ఆసుపత్రులు"),
                    ("facilities", "ఆరోగ్య కేంద్రాలు"),
                    ("shops", "దుకాణాలు"),
                ]
            ),
        });
        nearby_templates.insert("kn".to_string(), NearbyTemplate {
            found_header: "{location} ಹತ್ತಿರದ {kind}:".to_string(),
            not_found: "ಕ್ಷಮಿಸಿ, {location} ಹತ್ತಿರ ಯಾವುದೇ {kind} ಸಿಗಲಿಲ್ಲ. ದಯವಿಟ್ಟು ನಿಮ್ಮ ಪಿನ್‌ಕೋಡ್ ತಿಳಿಸಿ.".to_string(),
            your_location: "ನಿಮ್ಮ ಸ್ಥಳ".to_string(),
            pincode_location: "ಪಿನ್‌ಕೋಡ್ {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "ಕ್ಲಿನಿಕ್‌ಗಳು"),
                    ("pharmacy", "ಔಷಧಾಲಯಗಳು"),
                    ("hospital", "ಆಸ್ಪತ್ರೆಗಳು"),
                    ("facilities", "ಆರೋಗ್ಯ ಕೇಂದ್ರಗಳು"),
                    ("shops", "ಅಂಗಡಿಗಳು"),
                ]
            ),
        });
        nearby_templates.insert("bn".to_string(), NearbyTemplate {
            found_header: "{location} এর কাছে {kind}:".to_string(),
            not_found: "দুঃখিত, {location} এর কাছে কোনো {kind} পাওয়া যায়নি। অনুগ্রহ করে আপনার পিনকোড জানান।".to_string(),
            your_location: "আপনার অবস্থান".to_string(),
            pincode_location: "পিনকোড {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "ক্লিনিক"),
                    ("pharmacy", "ফার্মেসি"),
                    ("hospital", "হাসপাতাল"),
                    ("facilities", "স্বাস্থ্যকেন্দ্র"),
                    ("shops", "দোকান"),
                ]
            ),
        });
        nearby_templates.insert("gu".to_string(), NearbyTemplate {
            found_header: "{location} નજીક {kind}:".to_string(),
            not_found: "માફ કરશો, {location} નજીક કોઈ {kind} મળ્યું નથી. કૃપા કરીને તમારો પિનકોડ જણાવો.".to_string(),
            your_location: "તમારા સ્થાન".to_string(),
            pincode_location: "પિનકોડ {pincode}".to_string(),
            kinds: string_map(
                &[
                    ("clinic", "ક્લિનિક"),
                    ("pharmacy", "દવાની દુકાનો"),
                    ("hospital", "હોસ્પિટલો"),
                    ("facilities", "આરોગ્ય કેન્દ્રો"),
                    ("shops", "દુકાનો"),
                ]
            ),
        });

        Self {
            system_base: "You are GramSathi, a helpful AI assistant for rural India.\nHelp with: basic healthcare guidance (non-diagnostic) and local commerce.\n\nRULES:\n- NEVER diagnose. Recommend a doctor for serious conditions.\n- Be concise. Use simple language.\n- If intent is unclear, ask one short clarifying question.\n".to_string(),
            language_directives,
            health_extra: "You are handling a HEALTH query.\n- Provide safe home-care advice and when to see a doctor.\n- NEVER diagnose.\n- Always end with: \"यह सामान्य जानकारी है। डॉक्टर से परामर्श अवश्य लें।\"\n".to_string(),
            emergency_messages,
            emergency_fallback: "⚠️ यह गंभीर स्थिति लग रही है। कृपया तुरंत नजदीकी अस्पताल जाएं या 108 पर कॉल करें।\n\nThis appears to be an emergency. Please call 108 or go to the nearest hospital immediately.".to_string(),
            query_templates,
            nearby_templates,
        }
    }
}

/// Built-in prompts, or the file at `path` layered over them.
pub fn load_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, BoxError> {
    let Some(path) = path else {
        return Ok(Arc::new(PromptConfig::default()));
    };
    let file_content = fs
        ::read_to_string(path)
        .map_err(|e| format!("Failed to read prompts file '{}': {}", path, e))?;
    let config: PromptConfig = serde_json
        ::from_str(&file_content)
        .map_err(|e| format!("Failed to parse prompts file '{}': {}", path, e))?;
    config.validate()?;
    info!("Loaded prompts from {}", path);
    Ok(Arc::new(config))
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        for key in ["intent_classification", "location_extraction", "doctor_summary"] {
            if !self.query_templates.contains_key(key) {
                return Err(PromptError::TemplateNotFound(format!("query_templates:{}", key)));
            }
        }
        if !self.nearby_templates.contains_key(FALLBACK_LANGUAGE) {
            return Err(
                PromptError::TemplateNotFound(format!("nearby_templates:{}", FALLBACK_LANGUAGE))
            );
        }
        Ok(())
    }

    pub fn language_directive(&self, language: &str) -> &str {
        self.language_directives
            .get(language)
            .or_else(|| self.language_directives.get(FALLBACK_LANGUAGE))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn emergency_message(&self, language: &str) -> &str {
        self.emergency_messages
            .get(language)
            .map(|s| s.as_str())
            .unwrap_or(&self.emergency_fallback)
    }

    pub fn nearby_template(&self, language: &str) -> Option<&NearbyTemplate> {
        self.nearby_templates
            .get(language)
            .or_else(|| self.nearby_templates.get(FALLBACK_LANGUAGE))
    }

    fn query_template(&self, key: &str) -> Result<&str, PromptError> {
        self.query_templates
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| PromptError::TemplateNotFound(format!("query_templates:{}", key)))
    }

    pub fn intent_prompt(&self, message: &str) -> Result<String, PromptError> {
        Ok(self.query_template("intent_classification")?.replace("{message}", message))
    }

    pub fn location_prompt(&self, message: &str) -> Result<String, PromptError> {
        Ok(self.query_template("location_extraction")?.replace("{message}", message))
    }

    pub fn doctor_summary_prompt(
        &self,
        symptoms: &str,
        context: &str
    ) -> Result<String, PromptError> {
        Ok(
            self
                .query_template("doctor_summary")?
                .replace("{symptoms}", symptoms)
                .replace("{context}", context)
        )
    }
}
