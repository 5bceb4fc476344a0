use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;

const ASSIST_TEMPLATE: &str = "You are a helpful, patient, and friendly AI assistant for NeuroNest, a platform supporting individuals with neurodivergent conditions like Autism and Dyslexia.

Your role is to:
- Provide clear, simple, and direct responses
- Be encouraging and supportive
- Help with daily tasks, reminders, and emotional support
- Use simple language and avoid metaphors or abstract concepts
- Be patient and understanding
- Break down complex ideas into small, manageable steps
- Use positive reinforcement
{context_section}

Remember: Your responses should be easy to understand, supportive, and actionable.";

const EMOTIONAL_SUPPORT_TEMPLATE: &str = "You are a compassionate AI assistant helping someone who is feeling {emotion}.

Provide:
- Supportive and validating responses
- Calming and helpful advice
- Simple, clear language
- Practical coping strategies
- Encouragement and understanding

Keep your response brief, warm, and actionable.";

const LEARNING_TEMPLATE: &str = "You are a patient teacher helping someone learn about {topic}.

Teaching approach:
- Explain things in a very simple, visual way
- Use concrete examples and avoid abstract concepts
- Break down complex ideas into small steps
- Use encouraging language
- Provide practical exercises
- Difficulty level: {difficulty}

Make learning fun, engaging, and accessible!";

pub const DEFAULT_DIFFICULTY: &str = "beginner";

#[derive(Debug)]
pub enum PromptError {
    MissingPlaceholder { template: &'static str, placeholder: &'static str },
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::MissingPlaceholder { template, placeholder } =>
                write!(f, "Prompt template '{}' is missing placeholder '{}'", template, placeholder),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// System-prompt templates, one per use case. Fields left out of a prompts file keep the
/// built-in text.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    pub assist: String,
    pub emotional_support: String,
    pub learning: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            assist: ASSIST_TEMPLATE.to_string(),
            emotional_support: EMOTIONAL_SUPPORT_TEMPLATE.to_string(),
            learning: LEARNING_TEMPLATE.to_string(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        let required = [
            ("assist", &self.assist, "{context_section}"),
            ("emotional_support", &self.emotional_support, "{emotion}"),
            ("learning", &self.learning, "{topic}"),
        ];
        for (template, text, placeholder) in required {
            if !text.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder { template, placeholder });
            }
        }
        Ok(())
    }
}

pub fn load_prompts_from_str(json: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let config: PromptConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(Arc::new(config))
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config = load_prompts_from_str(&file_content)?;
    info!("Loaded prompt templates from {}", path.as_ref().display());
    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Fills `{name}` placeholders in one left-to-right pass. Inserted values are never re-scanned,
/// and unknown placeholders are left as written.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            vars.iter().find(|(key, _)| *key == name).map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn get_assist_prompt(config: &PromptConfig, context: Option<&str>) -> String {
    let section = non_empty(context)
        .map(|c| format!("\nCurrent context: {}", c))
        .unwrap_or_default();
    render(&config.assist, &[("context_section", &section)])
}

pub fn get_emotional_support_prompt(config: &PromptConfig, emotion: &str) -> String {
    render(&config.emotional_support, &[("emotion", emotion)])
}

pub fn get_learning_prompt(config: &PromptConfig, topic: &str, difficulty: &str) -> String {
    render(&config.learning, &[("topic", topic), ("difficulty", difficulty)])
}

pub fn emotion_user_message(emotion: &str, details: Option<&str>) -> String {
    match non_empty(details) {
        Some(details) => format!("I'm feeling {}. {}", emotion, details),
        None => format!("I'm feeling {}. Can you help me?", emotion),
    }
}

pub fn learning_user_message(topic: &str) -> String {
    format!("Can you help me learn about {}?", topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assist_prompt_without_context() {
        let prompt = get_assist_prompt(&PromptConfig::default(), None);
        assert!(prompt.starts_with("You are a helpful, patient, and friendly AI assistant for NeuroNest"));
        assert!(!prompt.contains("Current context"));
        assert!(!prompt.contains("{context_section}"));
        assert_eq!(prompt, get_assist_prompt(&PromptConfig::default(), Some("")));
    }

    #[test]
    fn assist_prompt_with_context() {
        let prompt = get_assist_prompt(&PromptConfig::default(), Some("doing homework"));
        assert!(prompt.contains("- Use positive reinforcement\n\nCurrent context: doing homework\n"));
    }

    #[test]
    fn emotion_and_learning_prompts() {
        let config = PromptConfig::default();
        assert!(get_emotional_support_prompt(&config, "anxious")
            .starts_with("You are a compassionate AI assistant helping someone who is feeling anxious."));
        let learning = get_learning_prompt(&config, "fractions", DEFAULT_DIFFICULTY);
        assert!(learning.contains("learn about fractions."));
        assert!(learning.contains("- Difficulty level: beginner"));
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let config = PromptConfig::default();
        let learning = get_learning_prompt(&config, "the {difficulty} word", "beginner");
        assert!(learning.contains("learn about the {difficulty} word."));
        assert!(learning.contains("- Difficulty level: beginner"));

        let learning = get_learning_prompt(&config, "maps", "{topic}");
        assert!(learning.contains("learn about maps."));
        assert!(learning.contains("- Difficulty level: {topic}"));

        let assist = get_assist_prompt(&config, Some("{context_section} again"));
        assert!(assist.contains("Current context: {context_section} again"));
        let emotion = get_emotional_support_prompt(&config, "{emotion}");
        assert!(emotion.contains("who is feeling {emotion}."));
    }

    #[test]
    fn render_leaves_unknown_and_unclosed_braces() {
        assert_eq!(render("a {x} {y} {", &[("x", "1")]), "a 1 {y} {");
        assert_eq!(render("{{x}}", &[("x", "1")]), "{1}");
        assert_eq!(render("héllo {x}é", &[("x", "ü")]), "héllo üé");
    }

    #[test]
    fn user_messages() {
        assert_eq!(emotion_user_message("anxious", None), "I'm feeling anxious. Can you help me?");
        assert_eq!(emotion_user_message("anxious", Some("")), "I'm feeling anxious. Can you help me?");
        assert_eq!(
            emotion_user_message("anxious", Some("before a test")),
            "I'm feeling anxious. before a test"
        );
        assert_eq!(learning_user_message("shapes"), "Can you help me learn about shapes?");
    }

    #[test]
    fn partial_prompt_file_keeps_defaults() {
        let config = load_prompts_from_str(
            r#"{"learning": "Teach {topic} at {difficulty} level."}"#
        ).unwrap();
        assert_eq!(get_learning_prompt(&config, "maps", "advanced"), "Teach maps at advanced level.");
        assert_eq!(config.assist, PromptConfig::default().assist);
    }

    #[test]
    fn prompt_file_missing_placeholder_is_rejected() {
        let err = load_prompts_from_str(r#"{"emotional_support": "Be nice."}"#).unwrap_err();
        assert!(matches!(err, PromptError::MissingPlaceholder { placeholder: "{emotion}", .. }));
    }

    #[test]
    fn bad_json_is_rejected() {
        assert!(matches!(load_prompts_from_str("{"), Err(PromptError::JsonError(_))));
    }
}
