use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of language rows the form accepts.
pub const MAX_LANGUAGES: usize = 10;

/// Language names offered by the form. Free text is still accepted.
pub const LANGUAGE_OPTIONS: &[&str] = &[
    "English", "Arabic", "French", "Spanish", "German", "Hebrew", "Chinese", "Russian", "Hindi",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Proficiency {
    Basic,
    Conversational,
    Fluent,
    Native,
}

impl Proficiency {
    pub const ALL: [Proficiency; 4] = [
        Proficiency::Basic,
        Proficiency::Conversational,
        Proficiency::Fluent,
        Proficiency::Native,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Proficiency::Basic => "Basic",
            Proficiency::Conversational => "Conversational",
            Proficiency::Fluent => "Fluent",
            Proficiency::Native => "Native",
        }
    }
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub proficiency: Proficiency,
}

impl fmt::Display for LanguageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.language, self.proficiency)
    }
}

/// Everything the candidate typed into the form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub job_title: String,
    pub linkedin: Option<String>,
    pub skills: String,
    pub experience: String,
    pub projects: String,
    pub education: String,
    pub languages: Vec<LanguageEntry>,
}

impl CandidateProfile {
    /// Checks the fields generation cannot run without.
    /// Returns a single user-facing message naming every offending field.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("job title", &self.job_title),
            ("skills", &self.skills),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| *label)
        .collect();

        if !missing.is_empty() {
            return Err(format!(
                "Name, email, job title, and skills are required (missing: {})",
                missing.join(", ")
            ));
        }

        if self.languages.len() > MAX_LANGUAGES {
            return Err(format!(
                "At most {MAX_LANGUAGES} languages can be listed (got {})",
                self.languages.len()
            ));
        }

        Ok(())
    }

    /// The submitted languages as `"Language - Proficiency"` lines, in submission order.
    pub fn language_lines(&self) -> Vec<String> {
        self.languages.iter().map(ToString::to_string).collect()
    }

    pub fn linkedin_or_empty(&self) -> &str {
        self.linkedin.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> CandidateProfile {
    CandidateProfile {
        name: "Dana Levi".to_string(),
        email: "dana@example.com".to_string(),
        phone: "+972 50 000 0000".to_string(),
        address: "Haifa, Israel".to_string(),
        job_title: "Backend Engineer".to_string(),
        linkedin: Some("https://linkedin.com/in/danalevi".to_string()),
        skills: "Rust, PostgreSQL, Kubernetes".to_string(),
        experience: "3 years building payment APIs".to_string(),
        projects: "Open-source rate limiter".to_string(),
        education: "BSc Computer Science, Technion".to_string(),
        languages: vec![
            LanguageEntry {
                language: "Hebrew".to_string(),
                proficiency: Proficiency::Native,
            },
            LanguageEntry {
                language: "English".to_string(),
                proficiency: Proficiency::Fluent,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_profile_passes_validation() {
        assert!(sample_profile().validate().is_ok());
    }

    #[test]
    fn test_missing_required_fields_are_named() {
        let profile = CandidateProfile {
            name: "Dana".to_string(),
            email: "   ".to_string(),
            ..Default::default()
        };
        let message = profile.validate().unwrap_err();
        assert!(message.contains("email"));
        assert!(message.contains("job title"));
        assert!(message.contains("skills"));
        assert!(!message.contains("missing: name"));
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let profile = CandidateProfile {
            phone: String::new(),
            address: String::new(),
            linkedin: None,
            experience: String::new(),
            languages: vec![],
            ..sample_profile()
        };
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_too_many_languages_rejected() {
        let entry = LanguageEntry {
            language: "Other".to_string(),
            proficiency: Proficiency::Basic,
        };
        let profile = CandidateProfile {
            languages: vec![entry; MAX_LANGUAGES + 1],
            ..sample_profile()
        };
        assert!(profile.validate().unwrap_err().contains("At most 10"));
    }

    #[test]
    fn test_language_lines_keep_submission_order() {
        assert_eq!(
            sample_profile().language_lines(),
            vec!["Hebrew - Native".to_string(), "English - Fluent".to_string()]
        );
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let json = r#"{
            "name": "Dana",
            "email": "dana@example.com",
            "job_title": "Engineer",
            "skills": "Rust",
            "languages": [{"language": "French", "proficiency": "Conversational"}]
        }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.phone, "");
        assert!(profile.linkedin.is_none());
        assert_eq!(profile.languages[0].proficiency, Proficiency::Conversational);
    }
}
