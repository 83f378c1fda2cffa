//! Prompt discovery and matching.
//!
//! Network CLIs signal readiness with a trailing prompt line whose ending
//! varies with privilege and configuration level (`switch>`, `switch#`,
//! `switch(config)#`, ...). The prompt model is derived once per session
//! from the first observed prompt line: the known ending is stripped to get
//! the stem, then every configured ending is re-appended so mid-session
//! mode changes match without re-discovery.

use memchr::memmem;

/// The set of prompt strings one device can present during a session.
///
/// Immutable after discovery. Matching is substring containment, not an
/// anchored end-of-buffer test, because some transports interleave control
/// sequences after the visual prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptModel {
    /// The bare prompt with its ending stripped (e.g. `switch1`).
    stem: String,

    /// `stem + ending` for every configured ending variant.
    prompts: Vec<String>,
}

impl PromptModel {
    /// Derive the prompt model from raw output whose last line is a prompt.
    ///
    /// Trailing line breaks are ignored first (the login reads stop on
    /// containment, so the text can end past the prompt line). `endings` is
    /// the vendor's ending-variant list in priority order. The first ending
    /// the last line ends with is stripped to get the stem; the prompt set
    /// is then the stem joined with *every* ending. When no ending matches
    /// (unanticipated prompt shape) the whole last line becomes the only
    /// set element, so matching degrades to containment of that one derived
    /// prompt. An empty last line is a discovery failure; the bare ending
    /// variants become the set, so the empty string never does (it would
    /// match any buffer).
    pub fn discover(raw: &str, endings: &[String]) -> Self {
        let trimmed = raw.trim_end_matches(['\r', '\n']);
        let last_line = trimmed.rsplit('\n').next().unwrap_or("");
        log::debug!("prompt discovery: last line: {last_line:?}");

        let matched = endings.iter().find(|e| last_line.ends_with(e.as_str()));
        let (stem, prompts) = match matched {
            Some(ending) => {
                let stem = last_line[..last_line.len() - ending.len()].to_string();
                let prompts = endings.iter().map(|e| format!("{stem}{e}")).collect();
                (stem, prompts)
            }
            None if last_line.is_empty() => (String::new(), endings.to_vec()),
            None => (last_line.to_string(), vec![last_line.to_string()]),
        };

        log::debug!("prompt discovery: stem {stem:?}, {} variants", prompts.len());
        Self { stem, prompts }
    }

    /// The bare prompt stem.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// All prompt variants in the set.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// True iff any prompt variant is contained in `buffer`.
    pub fn matches_bytes(&self, buffer: &[u8]) -> bool {
        self.prompts
            .iter()
            .any(|p| memmem::find(buffer, p.as_bytes()).is_some())
    }

    /// True iff any prompt variant is contained in `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.matches_bytes(text.as_bytes())
    }

    /// The first prompt variant (in priority order) contained in `text`.
    pub fn find_in<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.prompts
            .iter()
            .find(|p| text.contains(p.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discover_from_config_prompt() {
        let model = PromptModel::discover(
            "switch1(config)#",
            &endings(&["(config)#", "#", ">"]),
        );
        assert_eq!(model.stem(), "switch1");
        assert_eq!(
            model.prompts(),
            &["switch1(config)#", "switch1#", "switch1>"]
        );
    }

    #[test]
    fn test_discover_uses_last_line() {
        let raw = "Welcome banner\r\nlast login yesterday\r\nsw-core>";
        let model = PromptModel::discover(raw, &endings(&["(config)#", ">", "#"]));
        assert_eq!(model.stem(), "sw-core");
        assert!(model.matches("output text\r\nsw-core#"));
    }

    #[test]
    fn test_discover_priority_order() {
        // "(config)#" must win over the plain "#" it also ends with.
        let model = PromptModel::discover("r1(config)#", &endings(&["(config)#", "#"]));
        assert_eq!(model.stem(), "r1");

        // Reversed priority strips only "#"; the stem keeps "(config)".
        let model = PromptModel::discover("r1(config)#", &endings(&["#", "(config)#"]));
        assert_eq!(model.stem(), "r1(config)");
    }

    #[test]
    fn test_discover_unknown_ending_falls_back_to_whole_line() {
        let model = PromptModel::discover("weird-cli%", &endings(&["#", ">"]));
        assert_eq!(model.stem(), "weird-cli%");
        assert_eq!(model.prompts(), &["weird-cli%"]);
        assert!(model.matches("output\nweird-cli%"));
        assert!(!model.matches("output without prompt"));
    }

    #[test]
    fn test_discover_ignores_trailing_line_breaks() {
        // Containment-based reads can hand over text ending past the
        // prompt line.
        let model = PromptModel::discover("\r\nsw1>\r\n", &endings(&["#", ">"]));
        assert_eq!(model.stem(), "sw1");
        assert!(model.matches("output\r\nsw1#"));
        assert!(!model.matches("totally unrelated output"));
    }

    #[test]
    fn test_discover_empty_text_keeps_bare_endings() {
        // An all-linebreak capture must not degrade to a match-everything
        // empty prompt.
        let model = PromptModel::discover("\r\n\r\n", &endings(&["#", ">"]));
        assert_eq!(model.stem(), "");
        assert_eq!(model.prompts(), &["#", ">"]);
        assert!(model.matches("sw1#"));
        assert!(!model.matches("no prompt characters here"));
    }

    #[test]
    fn test_matches_is_containment_not_anchored() {
        let model = PromptModel::discover("sw1#", &endings(&["#", ">"]));
        // Control noise after the visual prompt must not defeat the match.
        assert!(model.matches("some output\r\nsw1#\x1b[K"));
        assert!(!model.matches("some output\r\nsw2#"));
    }

    #[test]
    fn test_find_in_returns_priority_match() {
        let model = PromptModel::discover("sw1#", &endings(&["(config)#", "#", ">"]));
        assert_eq!(model.find_in("text\r\nsw1(config)#"), Some("sw1(config)#"));
        assert_eq!(model.find_in("text\r\nsw1#"), Some("sw1#"));
        assert_eq!(model.find_in("no prompt"), None);
    }
}
