//! Heuristic field backfill - deterministic inference over source text.
//!
//! The only stage permitted to synthesize field values. Fills what the
//! model failed to produce; never overwrites a value that is already
//! present. Total by construction: given any source text, the output rule
//! has a non-empty action, a non-empty target and at least one complete
//! condition (the catch-all guarantees the last part).

use regex::Regex;
use std::sync::OnceLock;

use crate::types::rule::{Condition, Rule};

/// Fallback action when no keyword group matches.
pub const DEFAULT_ACTION: &str = "apply_policy";

/// Fallback target when no keyword matches.
pub const DEFAULT_TARGET: &str = "subject";

/// Ordered action keyword groups; first group with a match wins.
const ACTION_KEYWORDS: &[(&[&str], &str)] = &[
    (&["off"], "grant_time_off"),
    (&["notify", "alert", "inform", "email", "message"], "notify"),
    (&["deny", "reject", "block", "prevent", "forbid"], "deny"),
    (
        &["schedule", "assign", "book", "arrange", "plan", "reserve"],
        "schedule",
    ),
    (&["call", "contact"], "contact"),
    (&["approve", "allow", "grant", "get", "give", "offer"], "grant"),
];

/// Target keywords to canonical targets; first substring match wins.
const TARGET_KEYWORDS: &[(&str, &str)] = &[
    ("crew member", "crew_member"),
    ("deckhand", "deckhand"),
    ("casual pool", "casual_pool"),
    ("employees", "employees"),
    ("employee", "employee"),
    ("staff", "staff"),
    ("supervisor", "supervisor"),
    ("manager", "manager"),
    ("contractor", "contractor"),
    ("worker", "worker"),
    ("shift", "shift"),
];

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

fn hours_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:over|more than|greater than|above|exceeds)\s+(\d+)\s*hours?").unwrap()
    })
}

/// Fill missing rule fields from the original source text.
///
/// Idempotent pass-through when all core fields are present. Structurally
/// incomplete condition entries are pruned so the filled rule always
/// satisfies the validator's every-element requirement.
pub fn backfill(mut rule: Rule, source_text: &str) -> Rule {
    let lowered = source_text.to_lowercase();

    if rule.action.trim().is_empty() {
        rule.action = infer_action(&lowered);
    }
    if rule.target.trim().is_empty() {
        rule.target = infer_target(&lowered);
    }

    rule.conditions.retain(Condition::is_complete);
    if rule.conditions.is_empty() {
        rule.conditions = infer_conditions(&lowered);
    }
    if rule.conditions.is_empty() {
        rule.conditions
            .push(Condition::new("context", "contains", source_text.trim()));
    }

    rule
}

/// Infer an action from lower-cased source text.
///
/// Tests the ordered keyword groups; first match wins, otherwise
/// [`DEFAULT_ACTION`].
pub fn infer_action(lowered: &str) -> String {
    for (keywords, action) in ACTION_KEYWORDS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return (*action).to_string();
        }
    }
    DEFAULT_ACTION.to_string()
}

/// Infer a canonical target from lower-cased source text.
pub fn infer_target(lowered: &str) -> String {
    for (keyword, target) in TARGET_KEYWORDS {
        if lowered.contains(keyword) {
            return (*target).to_string();
        }
    }
    DEFAULT_TARGET.to_string()
}

/// Infer conditions from lower-cased source text.
///
/// One `day_of_week` condition per weekday mentioned, plus a
/// `hours_worked` condition for "over/more than/... N hours" phrasing.
/// May return an empty list; the caller adds the catch-all.
pub fn infer_conditions(lowered: &str) -> Vec<Condition> {
    let mut conditions: Vec<Condition> = WEEKDAYS
        .iter()
        .filter(|day| lowered.contains(*day))
        .map(|day| Condition::new("day_of_week", "equals", *day))
        .collect();

    if let Some(caps) = hours_pattern().captures(lowered) {
        conditions.push(Condition::new("hours_worked", "greater_than", &caps[1]));
    }

    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn complete_rule() -> Rule {
        Rule {
            action: "notify".to_string(),
            target: "crew_member".to_string(),
            conditions: vec![Condition::new("day_of_week", "equals", "monday")],
            ..Default::default()
        }
    }

    #[test]
    fn test_backfill_is_non_destructive() {
        let rule = complete_rule();
        let filled = backfill(rule.clone(), "completely unrelated text about saturdays off");
        assert_eq!(filled, rule);
    }

    #[test]
    fn test_backfill_fills_action_only_when_missing() {
        let mut rule = complete_rule();
        rule.action = String::new();
        let filled = backfill(rule, "please deny the request");
        assert_eq!(filled.action, "deny");
        assert_eq!(filled.target, "crew_member"); // untouched
    }

    #[test]
    fn test_action_group_order_first_match_wins() {
        // "off" group precedes "notify" group.
        assert_eq!(infer_action("email me when someone takes off"), "grant_time_off");
        assert_eq!(infer_action("email the supervisor"), "notify");
        assert_eq!(infer_action("call the office"), "contact");
        assert_eq!(infer_action("nothing recognizable"), DEFAULT_ACTION);
    }

    #[test]
    fn test_target_first_substring_match_wins() {
        assert_eq!(infer_target("any crew member on duty"), "crew_member");
        assert_eq!(infer_target("a deckhand works late"), "deckhand");
        assert_eq!(infer_target("all employees must sign"), "employees");
        assert_eq!(infer_target("no recognizable subject"), DEFAULT_TARGET);
    }

    #[test]
    fn test_weekday_conditions_one_per_match() {
        let conditions = infer_conditions("closed monday and friday");
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0], Condition::new("day_of_week", "equals", "monday"));
        assert_eq!(conditions[1], Condition::new("day_of_week", "equals", "friday"));
    }

    #[test]
    fn test_hours_phrasings() {
        for phrasing in [
            "works over 12 hours",
            "more than 12 hours",
            "greater than 12 hours",
            "above 12 hours",
            "exceeds 12 hours",
        ] {
            let conditions = infer_conditions(phrasing);
            assert_eq!(
                conditions,
                vec![Condition::new("hours_worked", "greater_than", "12")],
                "failed for: {}",
                phrasing
            );
        }
        assert!(infer_conditions("works 12 hours").is_empty());
    }

    #[test]
    fn test_catch_all_condition_when_nothing_inferred() {
        let filled = backfill(Rule::default(), "  be kind to each other  ");
        assert_eq!(
            filled.conditions,
            vec![Condition::new("context", "contains", "be kind to each other")]
        );
        assert!(filled.has_core_fields());
    }

    #[test]
    fn test_incomplete_conditions_pruned_before_inference() {
        let rule = Rule {
            action: "notify".to_string(),
            target: "crew".to_string(),
            conditions: vec![Condition::new("day_of_week", "", "")],
            ..Default::default()
        };
        let filled = backfill(rule, "when a deckhand works over 10 hours");
        assert_eq!(
            filled.conditions,
            vec![Condition::new("hours_worked", "greater_than", "10")]
        );
    }

    #[test]
    fn test_complete_conditions_survive_alongside_incomplete() {
        let rule = Rule {
            action: "notify".to_string(),
            target: "crew".to_string(),
            conditions: vec![
                Condition::new("day_of_week", "equals", "monday"),
                Condition::new("", "", ""),
            ],
            ..Default::default()
        };
        let filled = backfill(rule, "anything");
        assert_eq!(
            filled.conditions,
            vec![Condition::new("day_of_week", "equals", "monday")]
        );
    }

    proptest! {
        #[test]
        fn backfill_is_total(text in ".{1,120}") {
            // Whitespace-only input still yields a complete rule through the
            // defaults, except that a blank catch-all value cannot count.
            prop_assume!(!text.trim().is_empty());
            let filled = backfill(Rule::default(), &text);
            prop_assert!(filled.has_core_fields());
        }

        #[test]
        fn backfill_never_overwrites(text in ".{0,120}") {
            let rule = complete_rule();
            prop_assert_eq!(backfill(rule.clone(), &text), rule);
        }
    }
}
