// Shared prompt fragments

use crate::models::{AnalysisOptions, ChatTurn, ProfileFields, Speaker};

/// Render known profile fields as a bullet list, skipping empty ones.
pub fn render_profile(profile: &ProfileFields) -> String {
    let mut out = String::new();
    let mut line = |label: &str, value: &str| {
        if !value.trim().is_empty() {
            out.push_str(&format!("- {}: {}\n", label, value.trim()));
        }
    };

    line("Name", profile.name.as_deref().unwrap_or_default());
    line("Age", &profile.age.map(|a| a.to_string()).unwrap_or_default());
    line("Gender", profile.gender.as_deref().unwrap_or_default());
    line("Location", profile.location.as_deref().unwrap_or_default());
    line("Occupation", profile.occupation.as_deref().unwrap_or_default());
    line("Education", profile.education.as_deref().unwrap_or_default());
    line("Platform", profile.platform.as_deref().unwrap_or_default());
    line("Interests", &profile.interests.join(", "));
    line("Bio", profile.bio.as_deref().unwrap_or_default());

    for prompt in &profile.prompts {
        if !prompt.answer.trim().is_empty() {
            out.push_str(&format!("- Prompt \"{}\": {}\n", prompt.question.trim(), prompt.answer.trim()));
        }
    }

    if out.is_empty() {
        out.push_str("(no profile text provided)\n");
    }
    out
}

/// Render a conversation, one line per turn.
pub fn render_chat(messages: &[ChatTurn]) -> String {
    if messages.is_empty() {
        return "(no messages provided)\n".to_string();
    }

    let mut out = String::new();
    for turn in messages {
        let who = match turn.speaker {
            Speaker::Me => "ME",
            Speaker::Them => "THEM",
            Speaker::Unknown => "UNKNOWN",
        };
        match &turn.timestamp {
            Some(ts) => out.push_str(&format!("[{}] {}: {}\n", ts, who, turn.text)),
            None => out.push_str(&format!("{}: {}\n", who, turn.text)),
        }
    }
    out
}

/// Closing instructions for prompts that expect a JSON object back.
pub fn json_instructions(schema: &str, options: &AnalysisOptions) -> String {
    format!(
        r#"Respond with ONLY a JSON object using exactly these keys (omit nothing, use null or [] when unknown):
{schema}

Write every free-text value in {language}. Keep JSON keys in English.
Be honest and specific, avoid generic statements, and never invent facts that are not supported by the material."#,
        schema = schema,
        language = options.language_name()
    )
}

/// Note appended when screenshots accompany the prompt.
pub fn image_note(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "One image is attached. Use what is visible in it.\n".to_string(),
        n => format!("{} images are attached, in order. Use what is visible in them.\n", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfilePrompt;

    #[test]
    fn test_render_profile_skips_empty_fields() {
        let profile = ProfileFields {
            name: Some("Maya".to_string()),
            age: Some(29),
            bio: Some("   ".to_string()),
            interests: vec!["climbing".to_string(), "jazz".to_string()],
            prompts: vec![ProfilePrompt {
                question: "Typical Sunday".to_string(),
                answer: "Farmers market then a nap".to_string(),
            }],
            ..Default::default()
        };

        let text = render_profile(&profile);
        assert!(text.contains("- Name: Maya"));
        assert!(text.contains("- Age: 29"));
        assert!(text.contains("- Interests: climbing, jazz"));
        assert!(text.contains("Typical Sunday"));
        assert!(!text.contains("Bio"));
        assert!(!text.contains("Location"));
    }

    #[test]
    fn test_render_empty_profile() {
        assert!(render_profile(&ProfileFields::default()).contains("no profile text"));
    }

    #[test]
    fn test_render_chat() {
        let chat = vec![
            ChatTurn {
                speaker: Speaker::Me,
                text: "Hey!".to_string(),
                timestamp: None,
            },
            ChatTurn {
                speaker: Speaker::Them,
                text: "hi :)".to_string(),
                timestamp: Some("21:04".to_string()),
            },
        ];
        assert_eq!(render_chat(&chat), "ME: Hey!\n[21:04] THEM: hi :)\n");
    }
}
