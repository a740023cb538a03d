use crate::utils::error::{Result, ScanError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const DEFAULT_MIN_LENGTH: usize = 5;

/// 從辨識文字中擷取類似序號的字串
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    pattern: Regex,
    /// 預設開啟：排除一般英文單字，但純字母的序號也會被略過
    require_digit: bool,
}

impl CandidateExtractor {
    pub fn new(min_length: usize, require_digit: bool) -> Result<Self> {
        if min_length == 0 {
            return Err(ScanError::InvalidConfigValueError {
                field: "extraction.min_length".to_string(),
                value: min_length.to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }

        // 字母不分大小寫，等同 (?i)[A-Z0-9-]
        let pattern = Regex::new(&format!(r"[A-Za-z0-9-]{{{},}}", min_length)).map_err(|e| {
            ScanError::ConfigValidationError {
                field: "extraction.min_length".to_string(),
                message: format!("Cannot build candidate pattern: {}", e),
            }
        })?;

        Ok(Self {
            pattern,
            require_digit,
        })
    }

    /// Returns unique candidates in first-seen order. An empty vector is the
    /// no-match outcome, not an error.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for m in self.pattern.find_iter(text) {
            let token = m.as_str().trim();
            if token.is_empty() {
                continue;
            }
            if self.require_digit && !token.bytes().any(|b| b.is_ascii_digit()) {
                continue;
            }
            if seen.insert(token) {
                candidates.push(token.to_string());
            }
        }

        candidates
    }
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self {
            pattern: default_pattern().clone(),
            require_digit: true,
        }
    }
}

fn default_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z0-9-]{5,}").unwrap())
}

/// Extracts with the default rules (length >= 5, at least one digit).
pub fn extract(text: &str) -> Vec<String> {
    CandidateExtractor::default().extract(text)
}
