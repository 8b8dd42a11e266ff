use crate::action::{Action, MultiAction, MultiActionTag};

const DESCRIPTION_SEPARATOR: &str = "; ";

/// Merge the actions produced by one tool round, in call order.
///
/// Zero actions yield `None` and a single action passes through untouched.
/// Two or more become one [`MultiAction`] whose members are the flattened
/// inputs, whose permission flag is set when any input needs permission, and
/// whose description joins the non-empty input descriptions.
pub fn compose(actions: Vec<Action>) -> Option<Action> {
    match actions.len() {
        0 => None,
        1 => actions.into_iter().next(),
        count => {
            let requires_permission = actions.iter().any(Action::requires_permission);
            let description = {
                let parts: Vec<&str> = actions
                    .iter()
                    .map(Action::description)
                    .filter(|d| !d.trim().is_empty())
                    .collect();
                if parts.is_empty() {
                    format!("Apply {count} actions")
                } else {
                    parts.join(DESCRIPTION_SEPARATOR)
                }
            };
            let members = actions.into_iter().flat_map(Action::into_members).collect();
            Some(Action::Multi(MultiAction {
                tag: MultiActionTag::MultiAction,
                actions: members,
                requires_permission,
                description,
            }))
        }
    }
}
