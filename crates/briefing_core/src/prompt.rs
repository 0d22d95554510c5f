use serde::{Deserialize, Serialize};

use crate::job::non_blank;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a witty tech news podcaster. Create a 5-minute script covering the top 5-10 most interesting tech stories. Summarize each story in 1-4 sentences, keeping the tone funny and entertaining. Aim for a mix of humor and information that will engage and amuse tech-savvy listeners. Focus solely on the content without any audio cues or formatting instructions. Return only the script that will be read by the text-to-speech system, without any additional instructions or metadata.";

pub const DEFAULT_USER_PROMPT: &str = "It's {date}. Create a hilarious and informative 5-minute podcast script covering the top 5-10 tech stories from the following content. Make it entertaining and engaging for our tech-loving audience. Return only the script to be read, without any formatting or instructions: {content}";

const DATE_PLACEHOLDER: &str = "{date}";
const CONTENT_PLACEHOLDER: &str = "{content}";

/// Optional system/user templates with `{date}` and `{content}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptTemplates {
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Picks job overrides over configured templates over the defaults, then
/// substitutes placeholders. A user template without `{content}` gets the
/// content appended.
pub fn build_prompts(
    overrides: &PromptTemplates,
    configured: &PromptTemplates,
    date: &str,
    content: &str,
) -> PromptPair {
    let system = non_blank(overrides.system.as_deref())
        .or_else(|| non_blank(configured.system.as_deref()))
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let user = non_blank(overrides.user.as_deref())
        .or_else(|| non_blank(configured.user.as_deref()))
        .unwrap_or(DEFAULT_USER_PROMPT);

    let mut user = user.to_string();
    if !user.contains(CONTENT_PLACEHOLDER) {
        user.push_str("\n\n");
        user.push_str(CONTENT_PLACEHOLDER);
    }

    PromptPair {
        system: fill(system, date, content),
        user: fill(&user, date, content),
    }
}

// Content goes in last so placeholders inside scraped text stay literal.
fn fill(template: &str, date: &str, content: &str) -> String {
    template
        .replace(DATE_PLACEHOLDER, date)
        .replace(CONTENT_PLACEHOLDER, content)
}
