//! Property positions under inheritance
//!
//! A property is order-valid unless it is an inherited copy whose owner's
//! superclass is on the diagram: such a copy follows the superclass's own
//! ordering. Only the immediate superclass is consulted. A copy whose
//! superclass is not on the diagram (for example one that only exists in the
//! database) owns its position.

use arch_schema::{OProperty, SchemaRegistry};
use tracing::debug;

/// Whether `property.order` is authoritative
pub fn is_order_valid(registry: &SchemaRegistry, property: &OProperty) -> bool {
    !(property.subclass_property && super_class_in_editor(registry, &property.owner_class))
}

fn super_class_in_editor(registry: &SchemaRegistry, owner: &str) -> bool {
    registry
        .class(owner)
        .and_then(|class| class.super_class.as_deref())
        .and_then(|name| registry.class(name))
        .is_some_and(|super_class| super_class.exists_in_editor)
}

/// Smallest order among order-valid properties; 0 when there is none
pub fn min_order_among_valid<'p, I>(registry: &SchemaRegistry, properties: I) -> i32
where
    I: IntoIterator<Item = &'p OProperty>,
{
    properties
        .into_iter()
        .filter(|p| is_order_valid(registry, p))
        .map(|p| p.order)
        .min()
        .unwrap_or(0)
}

/// Order-valid properties, relative order kept
pub fn order_valid_subset<'p, I>(registry: &SchemaRegistry, properties: I) -> Vec<&'p OProperty>
where
    I: IntoIterator<Item = &'p OProperty>,
{
    properties
        .into_iter()
        .filter(|p| is_order_valid(registry, p))
        .collect()
}

/// Order for a property appended after every order-valid one
pub fn next_order<'p, I>(registry: &SchemaRegistry, properties: I) -> i32
where
    I: IntoIterator<Item = &'p OProperty>,
{
    properties
        .into_iter()
        .filter(|p| is_order_valid(registry, p))
        .map(|p| p.order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Shift the order-valid properties of `class` by the smallest amount that
/// puts all of them at or after `floor`. Returns the shift applied.
pub fn shift_after(registry: &mut SchemaRegistry, class: &str, floor: i32) -> i32 {
    let Some(owner) = registry.class(class) else {
        return 0;
    };
    let valid: Vec<bool> = owner
        .properties
        .iter()
        .map(|p| is_order_valid(registry, p))
        .collect();
    if !valid.contains(&true) {
        return 0;
    }
    let min = min_order_among_valid(registry, &owner.properties);
    let shift = floor.saturating_sub(min).max(0);
    if shift == 0 {
        return 0;
    }

    if let Some(owner) = registry.class_mut(class) {
        for (property, valid) in owner.properties.iter_mut().zip(valid) {
            if valid {
                property.order = property.order.saturating_add(shift);
            }
        }
    }
    debug!(class, floor, shift, "Shifted own properties after inherited ones");
    shift
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use arch_schema::{OClass, PropertyType};

    // ===================
    // Strategies
    // ===================

    fn properties_strategy() -> impl Strategy<Value = Vec<(i32, bool)>> {
        prop::collection::vec((-1000i32..1000, any::<bool>()), 0..12)
    }

    fn build(entries: &[(i32, bool)], base_in_editor: bool) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        let mut base = OClass::new("Base");
        base.exists_in_editor = base_in_editor;
        let mut derived = OClass::new("Derived").with_super_class("Base");
        for (i, (order, copy)) in entries.iter().enumerate() {
            let mut property = OProperty::new(format!("p{i}"), "Derived", PropertyType::String)
                .with_order(*order);
            property.subclass_property = *copy;
            derived.push_property(property);
        }
        registry.insert(base).unwrap();
        registry.insert(derived).unwrap();
        registry
    }

    // ===================
    // Checks
    // ===================

    fn check_min_order(entries: &[(i32, bool)], base_in_editor: bool) -> Result<(), TestCaseError> {
        let registry = build(entries, base_in_editor);
        let properties = &registry.class("Derived").unwrap().properties;

        let expected = entries
            .iter()
            .filter(|(_, copy)| !(*copy && base_in_editor))
            .map(|(order, _)| *order)
            .min()
            .unwrap_or(0);
        prop_assert_eq!(min_order_among_valid(&registry, properties), expected);
        Ok(())
    }

    fn check_subset_keeps_order(entries: &[(i32, bool)]) -> Result<(), TestCaseError> {
        let registry = build(entries, true);
        let properties = &registry.class("Derived").unwrap().properties;

        let subset: Vec<&str> = order_valid_subset(&registry, properties)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        let expected: Vec<String> = entries
            .iter()
            .enumerate()
            .filter(|(_, (_, copy))| !copy)
            .map(|(i, _)| format!("p{i}"))
            .collect();
        prop_assert_eq!(subset, expected);
        Ok(())
    }

    fn check_shift_reaches_floor(entries: &[(i32, bool)], floor: i32) -> Result<(), TestCaseError> {
        let mut registry = build(entries, true);
        let before = registry.class("Derived").unwrap().properties.clone();
        let shift = shift_after(&mut registry, "Derived", floor);
        let after = &registry.class("Derived").unwrap().properties;

        prop_assert!(shift >= 0);
        for (old, new) in before.iter().zip(after) {
            if old.subclass_property {
                prop_assert_eq!(old.order, new.order);
            } else {
                prop_assert!(new.order >= floor);
                prop_assert_eq!(new.order - old.order, shift);
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn min_order_is_minimum_of_valid(entries in properties_strategy(), in_editor in any::<bool>()) {
            check_min_order(&entries, in_editor)?;
        }

        #[test]
        fn valid_subset_keeps_relative_order(entries in properties_strategy()) {
            check_subset_keeps_order(&entries)?;
        }

        #[test]
        fn shift_puts_valid_properties_after_floor(entries in properties_strategy(), floor in -1000i32..1000) {
            check_shift_reaches_floor(&entries, floor)?;
        }
    }
}
