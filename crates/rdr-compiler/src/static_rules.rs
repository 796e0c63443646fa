//! Static rule compilation.
//!
//! Rules whose templates contain no placeholders do not depend on
//! captured text, so they can be enforced declaratively without
//! per-request evaluation. This module compiles them into descriptors
//! for one-shot registration with the host enforcement mechanism.
//!
//! The collaborator is expected to replace the previous registration
//! wholesale (remove-all-then-add-all), never leaving it half-updated;
//! the sequential ids exist for exactly that batch replacement.

use serde::Serialize;

use rdr_core::rule::RedirectRule;
use rdr_core::types::RequestKind;

/// A declarative matcher description: pattern plus fixed target, one per
/// (rule, request kind) pair.
///
/// `match_expression` is the same anchored pattern text the dynamic path
/// matches with. The emitted subset (escapes, lazy groups, anchors) is
/// valid RE2, so the enforcement mechanism and the engine agree on what
/// matches. Case-insensitivity is carried as a flag rather than inline,
/// mirroring the dynamic compiler.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StaticRuleDescriptor {
    /// Sequential id for batch registration, starting at 1.
    pub id: u32,
    pub match_expression: String,
    pub target_url: String,
    pub request_kind: RequestKind,
    pub case_sensitive: bool,
}

/// Compile the statically enforceable subset of a rule list.
///
/// Eligible: enabled rules with a placeholder-free template, for each of
/// their request kinds except `history` (which is an evaluation trigger,
/// not a network filter).
pub fn compile_static(rules: &[RedirectRule]) -> Vec<StaticRuleDescriptor> {
    let mut descriptors = Vec::new();
    let mut next_id = 1u32;

    for rule in rules {
        if rule.disabled() || rule.has_placeholders() {
            continue;
        }

        for &kind in rule.applies_to() {
            if kind == RequestKind::History {
                continue;
            }

            descriptors.push(StaticRuleDescriptor {
                id: next_id,
                match_expression: rule.anchored_include_pattern().to_string(),
                target_url: rule.redirect_template().to_string(),
                request_kind: kind,
                case_sensitive: false,
            });
            next_id += 1;
        }
    }

    log::debug!("compiled {} static rule descriptors", descriptors.len());
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdr_core::rule::RuleDef;

    fn rule(def: RuleDef) -> RedirectRule {
        RedirectRule::compile(def).unwrap()
    }

    fn static_rule(include: &str, target: &str, kinds: Vec<RequestKind>) -> RedirectRule {
        rule(RuleDef {
            description: include.to_string(),
            include_pattern: include.to_string(),
            redirect_template: target.to_string(),
            applies_to: kinds,
            ..Default::default()
        })
    }

    #[test]
    fn test_descriptor_per_kind() {
        let rules = vec![static_rule(
            "http://example.com/*",
            "https://example.org/",
            vec![RequestKind::MainFrame, RequestKind::Script],
        )];

        let descriptors = compile_static(&rules);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].id, 1);
        assert_eq!(descriptors[0].request_kind, RequestKind::MainFrame);
        assert_eq!(descriptors[1].id, 2);
        assert_eq!(descriptors[1].request_kind, RequestKind::Script);
        assert!(!descriptors[0].case_sensitive);
    }

    #[test]
    fn test_match_expression_is_anchored_translation() {
        let rules = vec![static_rule(
            "http://example.com/*",
            "https://example.org/",
            vec![RequestKind::MainFrame],
        )];

        let descriptors = compile_static(&rules);
        assert_eq!(descriptors[0].match_expression, "^http://example\\.com/(.*?)$");
        assert_eq!(descriptors[0].target_url, "https://example.org/");
    }

    #[test]
    fn test_placeholder_rules_excluded() {
        let rules = vec![static_rule(
            "http://example.com/*",
            "https://example.org/$1",
            vec![RequestKind::MainFrame],
        )];

        assert!(compile_static(&rules).is_empty());
    }

    #[test]
    fn test_disabled_rules_excluded() {
        let rules = vec![rule(RuleDef {
            description: "off".to_string(),
            include_pattern: "http://example.com/*".to_string(),
            redirect_template: "https://example.org/".to_string(),
            applies_to: vec![RequestKind::MainFrame],
            disabled: true,
            ..Default::default()
        })];

        assert!(compile_static(&rules).is_empty());
    }

    #[test]
    fn test_history_kind_never_emitted() {
        let rules = vec![static_rule(
            "http://example.com/*",
            "https://example.org/",
            vec![RequestKind::History, RequestKind::MainFrame],
        )];

        let descriptors = compile_static(&rules);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].request_kind, RequestKind::MainFrame);
    }

    #[test]
    fn test_serializes_for_enforcement_collaborator() {
        let rules = vec![static_rule(
            "http://example.com/fixed",
            "https://example.org/",
            vec![RequestKind::MainFrame],
        )];

        let json = serde_json::to_value(compile_static(&rules)).unwrap();
        assert_eq!(json[0]["matchExpression"], "^http://example\\.com/fixed$");
        assert_eq!(json[0]["requestKind"], "main_frame");
        assert_eq!(json[0]["caseSensitive"], false);
    }
}
