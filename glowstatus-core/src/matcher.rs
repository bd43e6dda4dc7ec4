//! Keyword matching of event titles against the rule table.

use crate::status::{StatusRule, StatusRules};

/// Return the first rule whose keyword appears anywhere in `title`,
/// case-insensitively. Rule order is priority order; `None` means the caller
/// applies its default policy.
pub fn match_status<'a>(title: &str, rules: &'a StatusRules) -> Option<&'a StatusRule> {
    let title = title.to_lowercase();
    rules
        .rules()
        .iter()
        .find(|rule| title.contains(&rule.keyword.to_lowercase()))
}
