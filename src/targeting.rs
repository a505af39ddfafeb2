//! Targeting tree evaluation.
//!
//! A [`TargetingTree`] is an ordered list of OR-linked groups; each group is an ordered list of
//! AND-linked conditions. The tree matches when at least one group's conditions are all
//! satisfied.
//!
//! A [`TargetingError`] raised by any condition aborts evaluation of the whole tree, including
//! sibling OR-groups that have not been evaluated yet. Callers treat the error as "this group
//! does not match" and move on to the next candidate variation group.
use crate::configuration::{TargetingOperator, TargetingTree};
use crate::context::{Context, ContextValue};
use crate::error::TargetingError;

/// Reserved targeting key matching every visitor, regardless of context.
pub const ALL_USERS_KEY: &str = "fs_all_users";

/// Reserved targeting key whose comparison value is the visitor id itself.
pub const VISITOR_ID_KEY: &str = "fs_users";

/// Evaluate `tree` against a visitor id and context.
pub fn targeting_match(
    tree: &TargetingTree,
    visitor_id: &str,
    context: &Context,
) -> Result<bool, TargetingError> {
    let visitor_value = ContextValue::String(visitor_id.to_owned());

    let mut global_match = false;
    for group in &tree.targeting_groups {
        // An empty condition list never matches.
        let mut group_match = !group.targetings.is_empty();

        for targeting in &group.targetings {
            let context_value = match targeting.key.as_str() {
                ALL_USERS_KEY => return Ok(true),
                VISITOR_ID_KEY => Some(&visitor_value),
                key => context.get(key),
            };

            match context_value {
                Some(value) => {
                    let matched = match_operator(targeting.operator, &targeting.value, value)?;
                    group_match = group_match && matched;
                }
                // A missing context key makes the group non-matching, but evaluation of the
                // group continues: later conditions may still error or hit the wildcard key.
                None => group_match = false,
            }
        }

        global_match = global_match || group_match;
    }

    Ok(global_match)
}

fn match_operator(
    operator: TargetingOperator,
    targeting_value: &ContextValue,
    context_value: &ContextValue,
) -> Result<bool, TargetingError> {
    if let ContextValue::List(values) = targeting_value {
        return match_operator_list(operator, values, context_value);
    }

    // Except for list operands, the context and targeting value types must agree.
    match (targeting_value, context_value) {
        (ContextValue::String(targeting), ContextValue::String(context)) => {
            match_operator_string(operator, targeting, context)
        }
        (ContextValue::Number(targeting), ContextValue::Number(context)) => {
            match_operator_number(operator, *targeting, *context)
        }
        (ContextValue::Bool(targeting), ContextValue::Bool(context)) => {
            match_operator_bool(operator, *targeting, *context)
        }
        _ => Err(TargetingError::TypeMismatch),
    }
}

/// "equals/contains"-class operators combine list elements with OR.
fn is_or_list_operator(operator: TargetingOperator) -> bool {
    matches!(
        operator,
        TargetingOperator::Equals | TargetingOperator::Contains
    )
}

/// "not-equals/not-contains"-class operators combine list elements with AND.
fn is_and_list_operator(operator: TargetingOperator) -> bool {
    matches!(
        operator,
        TargetingOperator::NotEquals | TargetingOperator::NotContains
    )
}

fn match_operator_list(
    operator: TargetingOperator,
    targeting_values: &[ContextValue],
    context_value: &ContextValue,
) -> Result<bool, TargetingError> {
    let mut matched = is_and_list_operator(operator);

    for targeting_value in targeting_values {
        let element_match = match_operator(operator, targeting_value, context_value)?;

        if is_and_list_operator(operator) {
            matched = matched && element_match;
        }
        if is_or_list_operator(operator) {
            matched = matched || element_match;
        }
    }

    Ok(matched)
}

fn match_operator_string(
    operator: TargetingOperator,
    targeting_value: &str,
    context_value: &str,
) -> Result<bool, TargetingError> {
    let targeting = targeting_value.to_lowercase();
    let context = context_value.to_lowercase();

    match operator {
        TargetingOperator::LowerThan => Ok(context < targeting),
        TargetingOperator::GreaterThan => Ok(context > targeting),
        TargetingOperator::LowerThanOrEquals => Ok(context <= targeting),
        TargetingOperator::GreaterThanOrEquals => Ok(context >= targeting),
        TargetingOperator::Equals => Ok(context == targeting),
        TargetingOperator::NotEquals => Ok(context != targeting),
        TargetingOperator::StartsWith => Ok(context.starts_with(&targeting)),
        TargetingOperator::EndsWith => Ok(context.ends_with(&targeting)),
        TargetingOperator::Contains => Ok(context.contains(&targeting)),
        TargetingOperator::NotContains => Ok(!context.contains(&targeting)),
        TargetingOperator::Null => Err(TargetingError::UnhandledOperator(operator)),
    }
}

fn match_operator_number(
    operator: TargetingOperator,
    targeting_value: f64,
    context_value: f64,
) -> Result<bool, TargetingError> {
    match operator {
        TargetingOperator::LowerThan => Ok(context_value < targeting_value),
        TargetingOperator::GreaterThan => Ok(context_value > targeting_value),
        TargetingOperator::LowerThanOrEquals => Ok(context_value <= targeting_value),
        TargetingOperator::GreaterThanOrEquals => Ok(context_value >= targeting_value),
        TargetingOperator::Equals => Ok(context_value == targeting_value),
        TargetingOperator::NotEquals => Ok(context_value != targeting_value),
        _ => Err(TargetingError::UnhandledOperator(operator)),
    }
}

fn match_operator_bool(
    operator: TargetingOperator,
    targeting_value: bool,
    context_value: bool,
) -> Result<bool, TargetingError> {
    match operator {
        TargetingOperator::Equals => Ok(context_value == targeting_value),
        TargetingOperator::NotEquals => Ok(context_value != targeting_value),
        _ => Err(TargetingError::UnhandledOperator(operator)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TargetingOperator::*;
    use crate::configuration::{Targeting, TargetingGroup};

    fn check_number(operator: TargetingOperator, targeting: f64, context: f64, expected: bool) {
        assert_eq!(
            match_operator_number(operator, targeting, context),
            Ok(expected),
            "{operator:?} tv={targeting} cv={context}"
        );
    }

    fn check_string(operator: TargetingOperator, targeting: &str, context: &str, expected: bool) {
        assert_eq!(
            match_operator_string(operator, targeting, context),
            Ok(expected),
            "{operator:?} tv={targeting:?} cv={context:?}"
        );
    }

    fn check_bool(operator: TargetingOperator, targeting: bool, context: bool, expected: bool) {
        assert_eq!(
            match_operator_bool(operator, targeting, context),
            Ok(expected),
            "{operator:?} tv={targeting} cv={context}"
        );
    }

    #[test]
    fn number_operators() {
        check_number(LowerThan, 11.0, 10.0, true);
        check_number(LowerThan, 10.0, 10.0, false);
        check_number(LowerThan, 9.0, 10.0, false);

        check_number(LowerThanOrEquals, 11.0, 10.0, true);
        check_number(LowerThanOrEquals, 10.0, 10.0, true);
        check_number(LowerThanOrEquals, 9.0, 10.0, false);

        check_number(GreaterThan, 11.0, 10.0, false);
        check_number(GreaterThan, 10.0, 10.0, false);
        check_number(GreaterThan, 9.0, 10.0, true);

        check_number(GreaterThanOrEquals, 11.0, 10.0, false);
        check_number(GreaterThanOrEquals, 10.0, 10.0, true);
        check_number(GreaterThanOrEquals, 9.0, 10.0, true);

        check_number(NotEquals, 11.0, 10.0, true);
        check_number(NotEquals, 10.0, 10.0, false);

        check_number(Equals, 10.0, 10.0, true);
        check_number(Equals, 9.0, 10.0, false);
    }

    #[test]
    fn number_operators_reject_string_operators() {
        assert_eq!(
            match_operator_number(Contains, 11.0, 10.0),
            Err(TargetingError::UnhandledOperator(Contains))
        );
        assert_eq!(
            match_operator_number(EndsWith, 10.0, 10.0),
            Err(TargetingError::UnhandledOperator(EndsWith))
        );
        assert_eq!(
            match_operator_number(StartsWith, 9.0, 10.0),
            Err(TargetingError::UnhandledOperator(StartsWith))
        );
    }

    #[test]
    fn bool_operators() {
        check_bool(NotEquals, true, false, true);
        check_bool(NotEquals, true, true, false);
        check_bool(NotEquals, false, true, true);

        check_bool(Equals, true, false, false);
        check_bool(Equals, true, true, true);
        check_bool(Equals, false, true, false);
    }

    #[test]
    fn bool_operators_reject_everything_else() {
        for operator in [
            Contains,
            EndsWith,
            StartsWith,
            GreaterThan,
            GreaterThanOrEquals,
            LowerThan,
            LowerThanOrEquals,
            Null,
        ] {
            assert_eq!(
                match_operator_bool(operator, true, false),
                Err(TargetingError::UnhandledOperator(operator))
            );
        }
    }

    #[test]
    fn string_operators() {
        check_string(LowerThan, "abc", "abd", false);
        check_string(LowerThan, "abc", "abc", false);
        check_string(LowerThan, "abd", "abc", true);

        check_string(LowerThanOrEquals, "abc", "abd", false);
        check_string(LowerThanOrEquals, "abc", "abc", true);
        check_string(LowerThanOrEquals, "abd", "abc", true);

        check_string(GreaterThan, "abc", "abd", true);
        check_string(GreaterThan, "abc", "abc", false);
        check_string(GreaterThan, "abd", "abc", false);

        check_string(GreaterThanOrEquals, "abc", "abd", true);
        check_string(GreaterThanOrEquals, "abd", "abc", false);

        check_string(NotEquals, "abc", "abd", true);
        check_string(NotEquals, "abc", "abc", false);
        check_string(NotEquals, "", " ", true);

        check_string(Equals, "abc", "abd", false);
        check_string(Equals, "abc", "abc", true);
        check_string(Equals, "", "", true);
        check_string(Equals, "", " ", false);

        check_string(StartsWith, "ab", "abc", true);
        check_string(StartsWith, "bc", "abc", false);
        check_string(EndsWith, "bc", "abc", true);
        check_string(EndsWith, "ab", "abc", false);
        check_string(Contains, "b", "abc", true);
        check_string(Contains, "d", "abc", false);
        check_string(NotContains, "d", "abc", true);
        check_string(NotContains, "b", "abc", false);
    }

    #[test]
    fn string_comparison_is_case_insensitive() {
        check_string(Equals, "ABC", "abc", true);
        check_string(Contains, "B", "abc", true);
        check_string(StartsWith, "AB", "abc", true);
        check_string(NotEquals, "ABC", "abc", false);
    }

    #[test]
    fn type_mismatch_is_an_error() {
        assert_eq!(
            match_operator(Equals, &1.0.into(), &true.into()),
            Err(TargetingError::TypeMismatch)
        );
        assert_eq!(
            match_operator(Equals, &"1".into(), &1.0.into()),
            Err(TargetingError::TypeMismatch)
        );
        assert_eq!(
            match_operator(NotEquals, &true.into(), &"true".into()),
            Err(TargetingError::TypeMismatch)
        );
    }

    #[test]
    fn list_operand_equals_is_an_any_match() {
        let list: ContextValue = vec!["alice".into(), "bob".into()].into();

        assert_eq!(match_operator(Equals, &list, &"bob".into()), Ok(true));
        assert_eq!(match_operator(Equals, &list, &"charlie".into()), Ok(false));
    }

    #[test]
    fn list_operand_not_equals_is_an_all_match() {
        let list: ContextValue = vec!["alice".into(), "bob".into()].into();

        assert_eq!(match_operator(NotEquals, &list, &"charlie".into()), Ok(true));
        assert_eq!(match_operator(NotEquals, &list, &"bob".into()), Ok(false));
    }

    #[test]
    fn list_operand_contains_classes() {
        let list: ContextValue = vec!["beta_".into(), "qa_".into()].into();

        assert_eq!(match_operator(Contains, &list, &"qa_user_1".into()), Ok(true));
        assert_eq!(match_operator(Contains, &list, &"prod_user".into()), Ok(false));
        assert_eq!(
            match_operator(NotContains, &list, &"prod_user".into()),
            Ok(true)
        );
        assert_eq!(
            match_operator(NotContains, &list, &"beta_user".into()),
            Ok(false)
        );
    }

    #[test]
    fn list_operand_with_non_list_operator_never_matches() {
        // Operators outside the equals/contains classes neither OR nor AND over elements, so the
        // result stays at its initial value without raising an error.
        let list: ContextValue = vec![1.0.into(), 2.0.into()].into();

        assert_eq!(match_operator(GreaterThan, &list, &5.0.into()), Ok(false));
    }

    #[test]
    fn list_element_type_mismatch_propagates() {
        let list: ContextValue = vec![1.0.into(), 2.0.into()].into();

        assert_eq!(
            match_operator(Equals, &list, &"two".into()),
            Err(TargetingError::TypeMismatch)
        );
    }

    fn tree(groups: Vec<Vec<Targeting>>) -> TargetingTree {
        TargetingTree {
            targeting_groups: groups
                .into_iter()
                .map(|targetings| TargetingGroup { targetings })
                .collect(),
        }
    }

    fn condition(
        operator: TargetingOperator,
        key: &str,
        value: impl Into<ContextValue>,
    ) -> Targeting {
        Targeting {
            operator,
            key: key.to_owned(),
            value: value.into(),
        }
    }

    #[test]
    fn all_users_key_matches_everyone() {
        let tree = tree(vec![vec![condition(Equals, ALL_USERS_KEY, "")]]);

        assert_eq!(targeting_match(&tree, "anyone", &Context::new()), Ok(true));
        assert_eq!(
            targeting_match(
                &tree,
                "",
                &[("plan".to_owned(), "basic".into())].into_iter().collect()
            ),
            Ok(true)
        );
    }

    #[test]
    fn all_users_key_wins_even_after_a_failed_condition() {
        let context: Context = [("plan".to_owned(), "silver".into())].into_iter().collect();
        let tree = tree(vec![vec![
            condition(Equals, "plan", "gold"),
            condition(Equals, ALL_USERS_KEY, ""),
        ]]);

        assert_eq!(targeting_match(&tree, "alice", &context), Ok(true));
    }

    #[test]
    fn visitor_id_key_compares_against_the_visitor_id() {
        let tree = tree(vec![vec![condition(
            Equals,
            VISITOR_ID_KEY,
            vec!["alice".into(), "bob".into()],
        )]]);

        assert_eq!(targeting_match(&tree, "alice", &Context::new()), Ok(true));
        assert_eq!(targeting_match(&tree, "charlie", &Context::new()), Ok(false));
    }

    #[test]
    fn and_conditions_within_a_group() {
        let tree = tree(vec![vec![
            condition(Equals, "plan", "premium"),
            condition(GreaterThan, "age", 21.0),
        ]]);

        let matching: Context = [
            ("plan".to_owned(), "premium".into()),
            ("age".to_owned(), 30.0.into()),
        ]
        .into_iter()
        .collect();
        let too_young: Context = [
            ("plan".to_owned(), "premium".into()),
            ("age".to_owned(), 18.0.into()),
        ]
        .into_iter()
        .collect();

        assert_eq!(targeting_match(&tree, "v", &matching), Ok(true));
        assert_eq!(targeting_match(&tree, "v", &too_young), Ok(false));
    }

    #[test]
    fn or_groups_rescue_a_non_matching_group() {
        let tree = tree(vec![
            vec![condition(Equals, "plan", "premium")],
            vec![condition(Equals, "beta", true)],
        ]);

        let context: Context = [
            ("plan".to_owned(), "basic".into()),
            ("beta".to_owned(), true.into()),
        ]
        .into_iter()
        .collect();

        assert_eq!(targeting_match(&tree, "v", &context), Ok(true));
    }

    #[test]
    fn missing_context_key_fails_the_group_without_error() {
        let tree = tree(vec![vec![condition(Equals, "plan", "premium")]]);

        assert_eq!(targeting_match(&tree, "v", &Context::new()), Ok(false));
    }

    #[test]
    fn empty_group_does_not_match() {
        let tree = tree(vec![vec![]]);

        assert_eq!(targeting_match(&tree, "v", &Context::new()), Ok(false));
    }

    #[test]
    fn empty_tree_does_not_match() {
        let tree = tree(vec![]);

        assert_eq!(targeting_match(&tree, "v", &Context::new()), Ok(false));
    }

    #[test]
    fn type_mismatch_aborts_the_whole_tree() {
        // The second OR-group would match on its own, but the error in the first group aborts
        // evaluation of the entire tree. Callers rely on this exact behavior.
        let context: Context = [
            ("age".to_owned(), true.into()),
            ("beta".to_owned(), true.into()),
        ]
        .into_iter()
        .collect();
        let tree = tree(vec![
            vec![condition(Equals, "age", 1.0)],
            vec![condition(Equals, "beta", true)],
        ]);

        assert_eq!(
            targeting_match(&tree, "v", &context),
            Err(TargetingError::TypeMismatch)
        );
    }

    #[test]
    fn type_mismatch_aborts_even_after_a_missing_key() {
        let context: Context = [("age".to_owned(), true.into())].into_iter().collect();
        let tree = tree(vec![vec![
            condition(Equals, "absent", "x"),
            condition(Equals, "age", 1.0),
        ]]);

        assert_eq!(
            targeting_match(&tree, "v", &context),
            Err(TargetingError::TypeMismatch)
        );
    }
}
