//! Prompts sent to the remote moderation model

use feedguard_core::{ChatMessage, LabelTag};

const POLICY: &str = "You are a careful, context-aware content moderator for a social platform.
Decide if the following POST TEXT and optional SOURCE LINKS should be allowed.

Rules (simplified):
- Allow mild profanity (e.g., \"damn\", \"hell\", casual swearing without targeting).
- Block bullying/harassment (targeted insults, slurs at a person/group).
- Block hate speech.
- Block explicit sexual content or sexual content involving minors.
- Block sexual solicitation, pornographic descriptions, or graphic sexual acts.
- Block credible threats or calls for violence.
- Block doxxing (posting private personal data).
- Block illegal solicitation (weapons, stolen cards, hard drugs).
- Links: flag if pointing to explicit porn, known shorteners without context, or obviously malicious hosts.
- Consider context and quotes. If user is condemning bad content, that is OK.";

const PROMPT_GATE: &str =
    "Classify the following user prompt as SAFE or UNSAFE. Respond only \"SAFE\" or \"UNSAFE\".";

/// Label vocabulary as a JSON array literal
fn label_vocabulary() -> String {
    let quoted: Vec<String> = LabelTag::ALL
        .iter()
        .map(|label| format!("\"{}\"", label.as_str()))
        .collect();
    format!("[{}]", quoted.join(","))
}

/// System and user messages for classifying a post
pub fn post_messages(text: &str, links: &[String]) -> Vec<ChatMessage> {
    let system = format!(
        "{POLICY}\n\nProvide a single JSON object with these fields:\n\
         - \"safe\": boolean\n\
         - \"labels\": array of strings chosen from: {}\n\
         - \"allow_reason\": short string\n\
         - \"block_reason\": short string\n\
         - \"message_to_user\": friendly, brief message if blocked",
        label_vocabulary()
    );

    let links = if links.is_empty() {
        "(none)".to_string()
    } else {
        links.iter().map(|l| format!("- {l}")).collect::<Vec<_>>().join("\n")
    };
    let user = format!("POST TEXT:\n\"\"\"{text}\"\"\"\n\nSOURCE LINKS:\n{links}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages for the SAFE/UNSAFE prompt gate
pub fn prompt_gate_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!("{PROMPT_GATE}\n\n\"\"\" {prompt} \"\"\""))]
}
