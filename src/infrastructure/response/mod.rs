use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

// First ```csv ... ``` (or bare ```) block, wherever it sits in the reply
static CODE_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*[ \t]*\r?\n([\s\S]*?)\r?\n?```").unwrap());

/// Cleans LLM response by removing reasoning tags and Markdown code fences
pub fn clean_llm_response(response: &str) -> String {
    let mut cleaned = THINK_TAG_PATTERN.replace_all(response, "").to_string();

    cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "").to_string();

    cleaned = cleaned.trim().to_string();

    if let Some(inner) = CODE_FENCE_PATTERN
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
    {
        cleaned = inner.as_str().trim().to_string();
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_think_tags() {
        let input = "<think>Some reasoning here</think>A,B\n1,2";
        assert_eq!(clean_llm_response(input), "A,B\n1,2");
    }

    #[test]
    fn test_clean_self_closing_think() {
        assert_eq!(clean_llm_response("<think />A,B"), "A,B");
    }

    #[test]
    fn test_clean_reasoning_tags() {
        let input = "<reasoning>Internal reasoning</reasoning>Final answer";
        assert_eq!(clean_llm_response(input), "Final answer");
    }

    #[test]
    fn test_clean_csv_code_fence() {
        let input = "```csv\nPhase,Course\n1,CS\n```";
        assert_eq!(clean_llm_response(input), "Phase,Course\n1,CS");
    }

    #[test]
    fn test_clean_bare_code_fence_with_crlf() {
        let input = "  ```\r\nA,B\r\n1,2\r\n```  ";
        assert_eq!(clean_llm_response(input), "A,B\r\n1,2");
    }

    #[test]
    fn test_clean_fence_surrounded_by_prose() {
        let input = "Here is the CSV:\n```csv\nA,B\n1,2\n```\nLet me know if you need more.";
        assert_eq!(clean_llm_response(input), "A,B\n1,2");
    }

    #[test]
    fn test_clean_takes_first_fenced_block() {
        let input = "```csv\nA,B\n1,2\n```\nNotes:\n```\nignored\n```";
        assert_eq!(clean_llm_response(input), "A,B\n1,2");
    }

    #[test]
    fn test_clean_preserves_normal_text() {
        let input = "Phase,Course\n1,\"CS, Hons\"";
        assert_eq!(clean_llm_response(input), input);
    }
}
