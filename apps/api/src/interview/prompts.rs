// All LLM prompt templates for the interview core.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::models::outline::InterviewOutline;

/// Question generation prompt. Replace: {title}, {description}, {required_skills},
/// {responsibilities}, {evaluation_criteria}, {single_question_instruction}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"You are an AI interviewer.

Interview Title:
{title}

Description:
{description}

Required Skills:
{required_skills}

Responsibilities:
{responsibilities}

Evaluation Criteria:
{evaluation_criteria}

Using the interview outline above: {single_question_instruction}
"#;

/// Header for the list of earlier questions the model must not reuse.
pub const AVOID_REPEAT_HEADER: &str = "\nDo NOT repeat or paraphrase the following questions; \
    produce a different, distinct technical question:";

/// Appended after each rejected near-duplicate.
pub const SUBSTANTIALLY_DIFFERENT_DIRECTIVE: &str =
    "\nPlease produce a substantially different question than those listed above.";

/// Answer evaluation prompt. Replace: {question}, {answer}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an AI interview evaluator.

Question:
"{question}"

Answer:
"{answer}"

1. Give short constructive feedback.
2. Give a score from 0 to 10.

Respond strictly in this format:
Score: <number>
Feedback: <text>
"#;

/// Live chat prompt. Replace: {title}, {description}, {required_skills},
/// {responsibilities}, {evaluation_criteria}, {message}
pub const CHAT_PROMPT_TEMPLATE: &str = r#"You are an AI interviewer assisting in a live interview session.

Interview Title:
{title}

Description:
{description}

Required Skills:
{required_skills}

Responsibilities:
{responsibilities}

Evaluation Criteria:
{evaluation_criteria}

The candidate says:
"{message}"

Respond as the AI interviewer: give a concise reply, optionally asking a follow-up technical question or giving brief feedback. Keep responses short and focused.
"#;

/// Fills the outline placeholders shared by the question and chat templates,
/// plus any `extra` values.
pub fn fill_outline(template: &str, outline: &InterviewOutline, extra: &[(&str, &str)]) -> String {
    let mut values = vec![
        ("title", outline.title.as_str()),
        ("description", outline.description.as_str()),
        ("required_skills", outline.required_skills.as_str()),
        ("responsibilities", outline.responsibilities.as_str()),
        ("evaluation_criteria", outline.evaluation_criteria.as_str()),
    ];
    values.extend_from_slice(extra);
    fill_template(template, &values)
}

/// Replaces `{name}` placeholders in one pass over the template. Substituted
/// text is never rescanned; unknown placeholders are left as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let value = after.find('}').and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
