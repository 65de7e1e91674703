// Resume generation: prompt → completion → parsed sections → rendered PDF.
// All completion calls go through llm_client; no direct HTTP calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod response_parser;
