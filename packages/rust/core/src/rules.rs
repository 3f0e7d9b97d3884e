//! Ordered substring rule tables.
//!
//! Rules are evaluated top-to-bottom and the first rule with a trigger
//! contained in the input wins. Precedence is therefore the table order.

/// One classifier rule: any trigger substring maps to `result`.
#[derive(Debug, Clone, Copy)]
pub struct Rule<T: 'static> {
    pub triggers: &'static [&'static str],
    pub result: T,
}

/// First rule whose trigger occurs in `haystack`, with the trigger that matched.
pub fn first_match<T: Copy>(rules: &[Rule<T>], haystack: &str) -> Option<(T, &'static str)> {
    rules.iter().find_map(|rule| {
        rule.triggers
            .iter()
            .find(|trigger| haystack.contains(*trigger))
            .map(|trigger| (rule.result, *trigger))
    })
}
