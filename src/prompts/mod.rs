/// Prompts Module
///
/// Reusable prompt templates offered to clients through `prompts/list` and
/// `prompts/get`.

pub mod greet_user;
