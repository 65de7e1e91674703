//! Prompt Builder — turns a candidate profile into the resume-writing prompt.

use crate::models::profile::CandidateProfile;

/// Keys the completion must return.
pub const SCHEMA_KEYS: [&str; 6] = [
    "summary",
    "skills",
    "education",
    "experience",
    "projects",
    "languages",
];

/// Keys whose values are arrays of strings.
pub const LIST_KEYS: [&str; 4] = ["skills", "experience", "projects", "languages"];

/// The JSON shape stated literally in the prompt.
pub const CV_SCHEMA: &str = r#"{
  "summary": "...",
  "skills": ["...", "..."],
  "education": "...",
  "experience": ["...", "..."],
  "projects": ["...", "..."],
  "languages": ["..."]
}"#;

const STYLE_INSTRUCTION: &str = "\
Make the tone professional and concise, suitable for a one-page CV.
Use bullet points where applicable.
Make the content compact and optimized to fit a single A4 page PDF. \
Limit each section to the most relevant 4-6 items. \
Avoid repetition, and use short, impactful phrases.";

const RETURN_INSTRUCTION: &str = "Return ONLY the JSON object.";

/// Builds the generation prompt. Candidate values are interpolated verbatim.
pub fn build_cv_prompt(profile: &CandidateProfile, schema: &str) -> String {
    let languages = profile.language_lines().join("\n");

    format!(
        "You are a CV writing assistant. Generate a JSON object with the following structure:\n\
         {schema}\n\
         {STYLE_INSTRUCTION}\n\
         Candidate Info:\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Address: {address}\n\
         LinkedIn: {linkedin}\n\
         Job Title: {job_title}\n\
         Skills: {skills}\n\
         Experience: {experience}\n\
         Projects: {projects}\n\
         Education: {education}\n\
         Languages: {languages}\n\
         {RETURN_INSTRUCTION}",
        name = profile.name,
        email = profile.email,
        phone = profile.phone,
        address = profile.address,
        linkedin = profile.linkedin_or_empty(),
        job_title = profile.job_title,
        skills = profile.skills,
        experience = profile.experience,
        projects = profile.projects,
        education = profile.education,
    )
}
