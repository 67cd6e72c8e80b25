//! Prompt templates for quiz and related-topic generation.

const MAX_PROMPT_SECTIONS: usize = 5;
const MAX_CONTENT_CHARS: usize = 3000;

const QUIZ_TEMPLATE: &str = r#"
You are an expert quiz writer. Given the Wikipedia article content below, generate exactly {num_questions}
multiple-choice questions (4 options each: A, B, C, D). Each question must be factual, grounded in the content,
and include: question, options (list of 4 full-text options), the correct answer text (not just letter), difficulty
(easy|medium|hard), short explanation, and the section name the question relates to.

Article Title: {title}
Article Summary: {summary}
Article Sections (first 5): {sections}
Article Content (truncated): {content}

Return ONLY valid JSON: a top-level array of question objects, each like:
[
  {
    "question": "Full question text",
    "options": ["Option text A", "Option text B", "Option text C", "Option text D"],
    "answer": "Option text B",
    "difficulty": "medium",
    "explanation": "Short explanation (1-2 sentences)",
    "section": "Introduction"
  }
]

Important:
- DO NOT return placeholders such as "Option 1", "Fact A", "Topic A" or single letters as answers.
- Options must be plausible distractors (all 4 must look like real choices).
- Provide the full option text in the "answer" field (matching exactly one of the items in options).
- Provide only JSON, with no extra text, markdown, or commentary.
"#;

const RELATED_TOPICS_TEMPLATE: &str = r#"
Given the article title "{title}", summary: {summary}, and sections: {sections},
return a JSON object with a single field "related_topics" containing a list of 3-5
related Wikipedia topic titles (as strings). Return ONLY valid JSON.

Example:
{ "related_topics": ["Topic A", "Topic B", "Topic C"] }
"#;

fn section_list(sections: &[String]) -> String {
    sections
        .iter()
        .take(MAX_PROMPT_SECTIONS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn quiz_prompt(
    title: &str,
    summary: &str,
    sections: &[String],
    content: &str,
    num_questions: usize,
) -> String {
    QUIZ_TEMPLATE
        .replace("{num_questions}", &num_questions.to_string())
        .replace("{title}", title)
        .replace("{summary}", summary)
        .replace("{sections}", &section_list(sections))
        .replace("{content}", truncate_chars(content, MAX_CONTENT_CHARS))
}

pub fn related_topics_prompt(title: &str, summary: &str, sections: &[String]) -> String {
    RELATED_TOPICS_TEMPLATE
        .replace("{title}", title)
        .replace("{summary}", summary)
        .replace("{sections}", &section_list(sections))
}
