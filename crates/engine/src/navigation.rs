//! Previous/next lookups used by the editor's page arrows.
//!
//! Both orders are circular: stepping past either end wraps to the other.

use std::cmp::Ordering;

use studio_core::{DbSymbol, Entity};

use crate::state::CollectionMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOrder {
    /// Numeric `id`, entities without one last.
    Id,
    /// Resolved display name, case-insensitive.
    Name,
}

/// Symbol adjacent to `current` in `entities`.
///
/// An empty collection yields `__undef__`. A `current` symbol missing from
/// the collection yields the first entity of the order for
/// [`Direction::Next`] and the last one for [`Direction::Previous`].
pub fn adjacent_identifier(
    entities: &CollectionMap,
    current: &str,
    direction: Direction,
    order: NavigationOrder,
    name_of: impl Fn(&Entity) -> String,
) -> DbSymbol {
    let ordered = match order {
        NavigationOrder::Id => ordered_by_id(entities),
        NavigationOrder::Name => ordered_by_name(entities, name_of),
    };
    let (Some(first), Some(last)) = (ordered.first(), ordered.last()) else {
        return DbSymbol::undefined();
    };

    let Some(position) = ordered.iter().position(|symbol| symbol.as_str() == current) else {
        return match direction {
            Direction::Next => (*first).clone(),
            Direction::Previous => (*last).clone(),
        };
    };

    let neighbor = match direction {
        Direction::Next => ordered.get(position + 1).unwrap_or(first),
        Direction::Previous => position
            .checked_sub(1)
            .and_then(|p| ordered.get(p))
            .unwrap_or(last),
    };
    (*neighbor).clone()
}

fn ordered_by_id(entities: &CollectionMap) -> Vec<&DbSymbol> {
    let mut keyed: Vec<(Option<i64>, &DbSymbol)> = entities
        .iter()
        .map(|(symbol, entity)| (entity.id(), symbol))
        .collect();
    keyed.sort_by(|(a_id, a_sym), (b_id, b_sym)| {
        compare_ids(*a_id, *b_id).then_with(|| a_sym.cmp(b_sym))
    });
    keyed.into_iter().map(|(_, symbol)| symbol).collect()
}

fn compare_ids(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ordered_by_name(entities: &CollectionMap, name_of: impl Fn(&Entity) -> String) -> Vec<&DbSymbol> {
    let mut keyed: Vec<(String, String, &DbSymbol)> = entities
        .iter()
        .map(|(symbol, entity)| {
            let name = name_of(entity);
            (name.to_lowercase(), name, symbol)
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, _, symbol)| symbol).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(entries: &[(&str, i64, &str)]) -> CollectionMap {
        entries
            .iter()
            .map(|(symbol, id, name)| {
                let entity = Entity::from_value(json!({
                    "klass": "Item",
                    "id": id,
                    "dbSymbol": symbol,
                    "name": name,
                }))
                .unwrap();
                (DbSymbol::new(*symbol).unwrap(), entity)
            })
            .collect()
    }

    fn name(entity: &Entity) -> String {
        entity.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string()
    }

    fn step(entities: &CollectionMap, current: &str, direction: Direction, order: NavigationOrder) -> String {
        adjacent_identifier(entities, current, direction, order, name).into_string()
    }

    #[test]
    fn id_order_steps_and_wraps() {
        let items = collection(&[("ten", 10, ""), ("one", 1, ""), ("five", 5, "")]);
        assert_eq!(step(&items, "five", Direction::Next, NavigationOrder::Id), "ten");
        assert_eq!(step(&items, "ten", Direction::Next, NavigationOrder::Id), "one");
        assert_eq!(step(&items, "five", Direction::Previous, NavigationOrder::Id), "one");
        assert_eq!(step(&items, "one", Direction::Previous, NavigationOrder::Id), "ten");
    }

    #[test]
    fn single_entity_is_its_own_neighbor() {
        let items = collection(&[("potion", 17, "Potion")]);
        for order in [NavigationOrder::Id, NavigationOrder::Name] {
            assert_eq!(step(&items, "potion", Direction::Next, order), "potion");
            assert_eq!(step(&items, "potion", Direction::Previous, order), "potion");
        }
    }

    #[test]
    fn empty_collection_is_undefined() {
        let items = CollectionMap::new();
        let next = adjacent_identifier(&items, "potion", Direction::Next, NavigationOrder::Id, name);
        assert!(next.is_undefined());
        let prev = adjacent_identifier(&items, "potion", Direction::Previous, NavigationOrder::Name, name);
        assert!(prev.is_undefined());
    }

    #[test]
    fn name_order_ignores_case_and_wraps() {
        let items = collection(&[
            ("potion", 1, "potion"),
            ("antidote", 2, "Antidote"),
            ("max_potion", 3, "Max Potion"),
        ]);
        assert_eq!(step(&items, "antidote", Direction::Next, NavigationOrder::Name), "max_potion");
        assert_eq!(step(&items, "max_potion", Direction::Next, NavigationOrder::Name), "potion");
        assert_eq!(step(&items, "potion", Direction::Next, NavigationOrder::Name), "antidote");
        assert_eq!(step(&items, "antidote", Direction::Previous, NavigationOrder::Name), "potion");
    }

    #[test]
    fn unknown_current_starts_at_the_ends() {
        let items = collection(&[("a", 3, "C"), ("b", 1, "B"), ("c", 2, "A")]);
        assert_eq!(step(&items, "gone", Direction::Next, NavigationOrder::Id), "b");
        assert_eq!(step(&items, "gone", Direction::Previous, NavigationOrder::Id), "a");
        assert_eq!(step(&items, "gone", Direction::Next, NavigationOrder::Name), "c");
        assert_eq!(step(&items, "gone", Direction::Previous, NavigationOrder::Name), "a");
    }

    #[test]
    fn entities_without_id_come_last() {
        let mut items = collection(&[("b", 2, ""), ("a", 1, "")]);
        let loose = Entity::from_value(json!({"klass": "Item", "dbSymbol": "loose"})).unwrap();
        items.insert(DbSymbol::new("loose").unwrap(), loose);
        assert_eq!(step(&items, "b", Direction::Next, NavigationOrder::Id), "loose");
        assert_eq!(step(&items, "loose", Direction::Next, NavigationOrder::Id), "a");
    }
}
