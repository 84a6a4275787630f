//! Option Pricing
//!
//! Resolves a customer's option choices for a menu item into a per-unit price delta and an
//! immutable snapshot of what was chosen.

use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    catalog::{MenuItem, MenuOption, OptionGroup, OptionGroupId, OptionId},
    money::{self, AmountError},
};

/// Errors produced while resolving option selections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The group does not belong to the menu item.
    #[error("option group {group} does not exist on this menu item")]
    UnknownOptionGroup {
        /// Requested group
        group: OptionGroupId,
    },

    /// The same group was listed more than once.
    #[error("option group {group} was selected more than once")]
    DuplicateGroup {
        /// Repeated group
        group: OptionGroupId,
    },

    /// The option does not belong to the group.
    #[error("option {option} does not exist in group {group}")]
    UnknownOption {
        /// Group searched
        group: OptionGroupId,
        /// Requested option
        option: OptionId,
    },

    /// The same option was chosen twice within a group.
    #[error("option {option} was selected more than once in group {group}")]
    DuplicateOption {
        /// Group containing the option
        group: OptionGroupId,
        /// Repeated option
        option: OptionId,
    },

    /// A required group has too few selections.
    #[error("group {group} requires at least {required} selection(s), got {selected}")]
    MissingRequiredSelection {
        /// Required group
        group: OptionGroupId,
        /// Minimum required
        required: u32,
        /// Number selected
        selected: u32,
    },

    /// An optional group was used but has fewer than its minimum.
    #[error("group {group} needs at least {min} selection(s), got {selected}")]
    TooFewSelections {
        /// Group in question
        group: OptionGroupId,
        /// Minimum once used
        min: u32,
        /// Number selected
        selected: u32,
    },

    /// A group has more selections than it allows.
    #[error("group {group} allows at most {max} selection(s), got {selected}")]
    TooManySelections {
        /// Group in question
        group: OptionGroupId,
        /// Maximum allowed
        max: u32,
        /// Number selected
        selected: u32,
    },

    /// An option is currently switched off.
    #[error("option {option} in group {group} is unavailable")]
    OptionUnavailable {
        /// Group containing the option
        group: OptionGroupId,
        /// Unavailable option
        option: OptionId,
    },

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// The options chosen from one group, in the order the customer picked them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Group the options belong to
    pub group: OptionGroupId,

    /// Chosen options in selection order
    pub options: SmallVec<[OptionId; 4]>,
}

impl Selection {
    /// Create a selection from a group and its chosen options.
    pub fn new(group: OptionGroupId, options: impl IntoIterator<Item = OptionId>) -> Self {
        Self {
            group,
            options: options.into_iter().collect(),
        }
    }
}

/// A snapshot of one chosen option, detached from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOption {
    /// Owning group id
    pub group: OptionGroupId,

    /// Owning group name at resolution time
    pub group_name: String,

    /// Option id
    pub option: OptionId,

    /// Option name at resolution time
    pub name: String,

    /// Listed additional price
    pub additional_price: u64,

    /// Price actually charged per unit (zero when covered by the free allowance)
    pub charged_price: u64,
}

/// The outcome of resolving a menu item's selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSelection {
    /// Per-unit price added by the chosen options
    pub unit_delta: u64,

    /// Every chosen option, grouped in menu order
    pub options: SmallVec<[SelectedOption; 4]>,
}

impl ResolvedSelection {
    /// Names of the chosen options, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.name.as_str())
    }
}

/// Validate `selections` against `item`'s option groups and price them.
///
/// Groups without an explicit selection fall back to their available default options.
/// Within a group, the first `free_selections` options (in selection order) cost nothing.
///
/// # Errors
///
/// Returns a [`SelectionError`] describing the first rule that was broken.
pub fn resolve_selection(
    item: &MenuItem,
    selections: &[Selection],
) -> Result<ResolvedSelection, SelectionError> {
    check_selection_groups(item, selections)?;

    let mut resolved = ResolvedSelection::default();

    for group in &item.option_groups {
        let chosen = match selections.iter().find(|selection| selection.group == group.id) {
            Some(selection) => chosen_options(group, &selection.options)?,
            None => group.default_options().collect(),
        };

        check_selection_count(group, &chosen)?;

        for (position, option) in chosen.into_iter().enumerate() {
            let is_free = u32::try_from(position).is_ok_and(|pos| pos < group.free_selections);
            let charged_price = if is_free { 0 } else { option.additional_price };

            resolved.unit_delta = money::add(resolved.unit_delta, charged_price)?;
            resolved.options.push(SelectedOption {
                group: group.id,
                group_name: group.name.clone(),
                option: option.id,
                name: option.name.clone(),
                additional_price: option.additional_price,
                charged_price,
            });
        }
    }

    Ok(resolved)
}

/// Every referenced group must exist on the item, and appear at most once.
fn check_selection_groups(item: &MenuItem, selections: &[Selection]) -> Result<(), SelectionError> {
    for (idx, selection) in selections.iter().enumerate() {
        if item.option_group(selection.group).is_none() {
            return Err(SelectionError::UnknownOptionGroup {
                group: selection.group,
            });
        }

        let repeated = selections
            .iter()
            .skip(idx + 1)
            .any(|other| other.group == selection.group);

        if repeated {
            return Err(SelectionError::DuplicateGroup {
                group: selection.group,
            });
        }
    }

    Ok(())
}

/// Look up each requested option, rejecting unknown, repeated or unavailable ones.
fn chosen_options<'a>(
    group: &'a OptionGroup,
    requested: &[OptionId],
) -> Result<SmallVec<[&'a MenuOption; 4]>, SelectionError> {
    let mut chosen: SmallVec<[&MenuOption; 4]> = SmallVec::with_capacity(requested.len());

    for &option_id in requested {
        let option = group
            .option(option_id)
            .ok_or(SelectionError::UnknownOption {
                group: group.id,
                option: option_id,
            })?;

        if chosen.iter().any(|existing| existing.id == option_id) {
            return Err(SelectionError::DuplicateOption {
                group: group.id,
                option: option_id,
            });
        }

        if !option.is_available {
            return Err(SelectionError::OptionUnavailable {
                group: group.id,
                option: option_id,
            });
        }

        chosen.push(option);
    }

    Ok(chosen)
}

fn check_selection_count(group: &OptionGroup, chosen: &[&MenuOption]) -> Result<(), SelectionError> {
    let selected = u32::try_from(chosen.len()).unwrap_or(u32::MAX);
    let min = group.effective_min();

    if group.is_required && selected < min {
        return Err(SelectionError::MissingRequiredSelection {
            group: group.id,
            required: min,
            selected,
        });
    }

    // Optional groups left untouched are fine; bounds apply once something is chosen.
    if selected == 0 {
        return Ok(());
    }

    if selected < min {
        return Err(SelectionError::TooFewSelections {
            group: group.id,
            min,
            selected,
        });
    }

    match group.effective_max() {
        Some(max) if selected > max => Err(SelectionError::TooManySelections {
            group: group.id,
            max,
            selected,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::catalog::{MenuItemId, RestaurantId, SelectionType};

    use super::*;

    fn option(name: &str, price: u64) -> MenuOption {
        MenuOption {
            id: OptionId::generate(),
            name: name.to_string(),
            additional_price: price,
            is_default: false,
            is_available: true,
        }
    }

    fn group(
        name: &str,
        selection_type: SelectionType,
        free_selections: u32,
        options: Vec<MenuOption>,
    ) -> OptionGroup {
        OptionGroup {
            id: OptionGroupId::generate(),
            name: name.to_string(),
            selection_type,
            min_selections: 0,
            max_selections: None,
            free_selections,
            is_required: false,
            options,
        }
    }

    fn item(option_groups: Vec<OptionGroup>) -> MenuItem {
        MenuItem {
            id: MenuItemId::generate(),
            restaurant: RestaurantId::generate(),
            name: "Margherita".to_string(),
            price: 10_00,
            is_available: true,
            option_groups,
        }
    }

    fn ids(group: &OptionGroup) -> Vec<OptionId> {
        group.options.iter().map(|option| option.id).collect()
    }

    #[test]
    fn free_allowance_covers_first_selections_in_order() -> TestResult {
        let toppings = group(
            "Toppings",
            SelectionType::Multiple,
            1,
            vec![option("Olives", 50), option("Ham", 1_00), option("Chicken", 1_50)],
        );
        let selection = Selection::new(toppings.id, ids(&toppings));
        let item = item(vec![toppings]);

        let resolved = resolve_selection(&item, &[selection])?;

        assert_eq!(resolved.unit_delta, 2_50);
        assert_eq!(resolved.names().collect::<Vec<_>>(), ["Olives", "Ham", "Chicken"]);
        assert_eq!(
            resolved.options.iter().map(|o| o.charged_price).collect::<Vec<_>>(),
            [0, 1_00, 1_50]
        );

        Ok(())
    }

    #[test]
    fn free_allowance_is_per_group() -> TestResult {
        let sauces = group("Sauces", SelectionType::Multiple, 1, vec![option("Garlic", 30)]);
        let toppings = group("Toppings", SelectionType::Multiple, 0, vec![option("Ham", 1_00)]);
        let selections = [
            Selection::new(sauces.id, ids(&sauces)),
            Selection::new(toppings.id, ids(&toppings)),
        ];
        let item = item(vec![sauces, toppings]);

        let resolved = resolve_selection(&item, &selections)?;

        assert_eq!(resolved.unit_delta, 1_00);

        Ok(())
    }

    #[test]
    fn required_group_without_selection_is_rejected() {
        let mut size = group("Size", SelectionType::Single, 0, vec![option("Large", 1_50)]);
        size.is_required = true;
        let group_id = size.id;
        let item = item(vec![size]);

        let result = resolve_selection(&item, &[]);

        assert_eq!(
            result,
            Err(SelectionError::MissingRequiredSelection {
                group: group_id,
                required: 1,
                selected: 0,
            })
        );
    }

    #[test]
    fn required_group_is_satisfied_by_defaults() -> TestResult {
        let mut regular = option("Regular", 0);
        regular.is_default = true;
        let mut size = group("Size", SelectionType::Single, 0, vec![regular, option("Large", 1_50)]);
        size.is_required = true;
        let item = item(vec![size]);

        let resolved = resolve_selection(&item, &[])?;

        assert_eq!(resolved.names().collect::<Vec<_>>(), ["Regular"]);
        assert_eq!(resolved.unit_delta, 0);

        Ok(())
    }

    #[test]
    fn single_group_rejects_two_options() {
        let size = group(
            "Size",
            SelectionType::Single,
            0,
            vec![option("Small", 0), option("Large", 1_50)],
        );
        let selection = Selection::new(size.id, ids(&size));
        let item = item(vec![size]);

        let result = resolve_selection(&item, &[selection]);

        assert!(
            matches!(result, Err(SelectionError::TooManySelections { max: 1, selected: 2, .. })),
            "expected TooManySelections, got {result:?}"
        );
    }

    #[test]
    fn multiple_group_enforces_bounds_once_used() -> TestResult {
        let mut extras = group(
            "Extras",
            SelectionType::Multiple,
            0,
            vec![option("A", 10), option("B", 20), option("C", 30)],
        );
        extras.min_selections = 2;
        extras.max_selections = Some(2);
        let all = ids(&extras);
        let group_id = extras.id;
        let item = item(vec![extras]);

        // Untouched optional group is fine.
        assert_eq!(resolve_selection(&item, &[])?.unit_delta, 0);

        let one = Selection::new(group_id, all.iter().copied().take(1));
        assert!(matches!(
            resolve_selection(&item, &[one]),
            Err(SelectionError::TooFewSelections { min: 2, selected: 1, .. })
        ));

        let three = Selection::new(group_id, all.iter().copied());
        assert!(matches!(
            resolve_selection(&item, &[three]),
            Err(SelectionError::TooManySelections { max: 2, selected: 3, .. })
        ));

        let two = Selection::new(group_id, all.iter().copied().take(2));
        assert_eq!(resolve_selection(&item, &[two])?.unit_delta, 30);

        Ok(())
    }

    #[test]
    fn unavailable_option_is_rejected() {
        let mut ham = option("Ham", 1_00);
        ham.is_available = false;
        let ham_id = ham.id;
        let toppings = group("Toppings", SelectionType::Multiple, 0, vec![ham]);
        let selection = Selection::new(toppings.id, [ham_id]);
        let item = item(vec![toppings]);

        let result = resolve_selection(&item, &[selection]);

        assert!(
            matches!(result, Err(SelectionError::OptionUnavailable { option, .. }) if option == ham_id),
            "expected OptionUnavailable, got {result:?}"
        );
    }

    #[test]
    fn unknown_and_duplicate_references_are_rejected() {
        let toppings = group("Toppings", SelectionType::Multiple, 0, vec![option("Ham", 1_00)]);
        let ham = ids(&toppings)[0];
        let group_id = toppings.id;
        let item = item(vec![toppings]);

        let stranger = OptionGroupId::generate();
        assert_eq!(
            resolve_selection(&item, &[Selection::new(stranger, [ham])]),
            Err(SelectionError::UnknownOptionGroup { group: stranger })
        );

        let missing = OptionId::generate();
        assert_eq!(
            resolve_selection(&item, &[Selection::new(group_id, [missing])]),
            Err(SelectionError::UnknownOption {
                group: group_id,
                option: missing
            })
        );

        assert_eq!(
            resolve_selection(&item, &[Selection::new(group_id, [ham, ham])]),
            Err(SelectionError::DuplicateOption {
                group: group_id,
                option: ham
            })
        );

        let twice = [
            Selection::new(group_id, [ham]),
            Selection {
                group: group_id,
                options: smallvec![],
            },
        ];
        assert_eq!(
            resolve_selection(&item, &twice),
            Err(SelectionError::DuplicateGroup { group: group_id })
        );
    }
}
