use serde::Deserialize;

/// The delimiter tokens that make up the scan grammar.
///
/// Both passes must scan with the same `Syntax`, otherwise the rewrite pass
/// cannot find the blocks recorded during collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Syntax {
    pub annotation_open: String,
    pub annotation_close: String,
    pub fence: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax {
            annotation_open: "<!---".to_string(),
            annotation_close: "-->".to_string(),
            fence: "```".to_string(),
        }
    }
}

impl Syntax {
    /// Name of the first token that is empty, if any. An empty token would
    /// match everywhere.
    pub fn empty_token(&self) -> Option<&'static str> {
        if self.annotation_open.is_empty() {
            Some("annotation-open")
        } else if self.annotation_close.is_empty() {
            Some("annotation-close")
        } else if self.fence.is_empty() {
            Some("fence")
        } else {
            None
        }
    }

    /// Strip the annotation's own delimiters, leaving the configuration
    /// payload. Either token may be missing (some styles close per line).
    pub fn annotation_body<'a>(&self, raw: &'a str) -> &'a str {
        let body = raw.strip_prefix(self.annotation_open.as_str()).unwrap_or(raw);
        body.strip_suffix(self.annotation_close.as_str())
            .unwrap_or(body)
    }
}
