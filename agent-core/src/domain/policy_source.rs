// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Policy Source (component F) resolution order. The fetching of each
//! candidate (workload annotation, namespace config object, environment)
//! is infrastructure's job; this module is the pure, priority-first
//! combinator so the ordering invariant is independently testable.

/// An immutable, resolved allow-set. Write-once at agent startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePolicy(pub Vec<String>);

impl EffectivePolicy {
    pub fn roots(&self) -> &[String] {
        &self.0
    }
}

pub const DEFAULT_ROOTS: &str = "/";

/// Split a comma-separated roots list, trimming whitespace around each
/// entry and dropping empty segments produced by stray commas.
pub fn parse_roots(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve strictly priority-first: the first candidate that is `Some`
/// wins, including `Some("")` which parses to an empty allow-set (deny
/// everything). `None` means the source was absent and resolution falls
/// through to the next one.
pub fn resolve(candidates: [Option<String>; 3]) -> EffectivePolicy {
    for candidate in candidates {
        if let Some(raw) = candidate {
            return EffectivePolicy(parse_roots(&raw));
        }
    }
    EffectivePolicy(parse_roots(DEFAULT_ROOTS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_wins_over_env() {
        let resolved = resolve([
            Some("/a".to_string()),
            None,
            Some("/b".to_string()),
        ]);
        assert_eq!(resolved.roots(), &["/a".to_string()]);
    }

    #[test]
    fn explicit_empty_list_denies_everything() {
        let resolved = resolve([Some(String::new()), None, None]);
        assert!(resolved.roots().is_empty());
    }

    #[test]
    fn falls_through_to_default_when_all_absent() {
        let resolved = resolve([None, None, None]);
        assert_eq!(resolved.roots(), &["/".to_string()]);
    }

    #[test]
    fn comma_separated_with_whitespace_trimmed() {
        assert_eq!(parse_roots(" /a ,/b,  /c"), vec!["/a", "/b", "/c"]);
    }
}
