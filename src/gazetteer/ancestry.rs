// src/gazetteer/ancestry.rs - Bounded, cycle-guarded walk over administrative parents
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};

use crate::errors::AmbiguousCycle;
use crate::gazetteer::index::PlaceIndex;
use crate::models::{Place, PlaceId};

/// Result of walking a place's administrative containment chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AncestryWalk {
    /// Ancestors ordered by hop distance, then declared parent order.
    pub ancestors: Vec<PlaceId>,
    /// First back edge met, if any. The walk does not follow it.
    pub cycle: Option<AmbiguousCycle>,
    /// True when some parent lay beyond the hop limit.
    pub depth_limited: bool,
}

impl AncestryWalk {
    pub fn contains(&self, id: PlaceId) -> bool {
        self.ancestors.contains(&id)
    }
}

fn admin_parents<I: PlaceIndex + ?Sized>(index: &I, id: PlaceId) -> Vec<PlaceId> {
    index
        .place(id)
        .map(|place| place.administrative_parents().map(|r| r.target).collect())
        .unwrap_or_default()
}

/// True when `target` lies on the chain that first reached `from`.
fn on_discovery_path(
    reached_via: &HashMap<PlaceId, Option<PlaceId>>,
    from: PlaceId,
    target: PlaceId,
) -> bool {
    let mut cursor = Some(from);
    while let Some(id) = cursor {
        if id == target {
            return true;
        }
        cursor = reached_via.get(&id).copied().flatten();
    }
    false
}

/// Walks administrative parents of `start` breadth first, up to `max_hops`
/// levels, so every ancestor is reached at its shortest hop distance. The
/// containment graph is not guaranteed acyclic: a parent on the chain that
/// reached the current place is a cycle, recorded and skipped; a parent
/// already reached another way is skipped silently.
pub fn walk_ancestors<I: PlaceIndex + ?Sized>(
    index: &I,
    start: PlaceId,
    max_hops: usize,
) -> AncestryWalk {
    let mut walk = AncestryWalk::default();
    // place -> the child it was first reached from
    let mut reached_via: HashMap<PlaceId, Option<PlaceId>> = HashMap::from([(start, None)]);
    let mut queue: VecDeque<(PlaceId, usize)> = VecDeque::from([(start, 0)]);

    while let Some((child, depth)) = queue.pop_front() {
        for parent in admin_parents(index, child) {
            if on_discovery_path(&reached_via, child, parent) {
                if walk.cycle.is_none() {
                    warn!(
                        "Containment cycle while walking ancestors of {}: {} -> {}; truncating",
                        start, child, parent
                    );
                    walk.cycle = Some(AmbiguousCycle {
                        from: child,
                        to: parent,
                    });
                }
                continue;
            }
            if reached_via.contains_key(&parent) {
                continue;
            }
            if depth + 1 > max_hops {
                walk.depth_limited = true;
                continue;
            }
            reached_via.insert(parent, Some(child));
            if index.place(parent).is_none() {
                debug!("Place {} references unknown parent {}", child, parent);
                continue;
            }
            walk.ancestors.push(parent);
            queue.push_back((parent, depth + 1));
        }
    }
    walk
}

/// First-level administrative division containing `place`: the place itself
/// when it is one, otherwise the ADM1 ancestor fewest hops away.
pub fn admin1_of<I: PlaceIndex + ?Sized>(
    index: &I,
    place: &Place,
    walk: &AncestryWalk,
) -> Option<PlaceId> {
    if place.is_admin1() {
        return Some(place.id);
    }
    walk.ancestors
        .iter()
        .copied()
        .find(|&id| index.place(id).is_some_and(|ancestor| ancestor.is_admin1()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::index::GazetteerBuilder;
    use crate::models::PlaceReference;
    use crate::test_support::{place, world_index, IDF_ID, FRANCE_ID, PARIS_FR_ID};

    #[test]
    fn test_walk_follows_admin_chain() {
        let index = world_index();
        let walk = walk_ancestors(&index, PARIS_FR_ID, 10);
        assert_eq!(walk.ancestors, vec![IDF_ID, FRANCE_ID]);
        assert!(walk.cycle.is_none());
        assert!(!walk.depth_limited);

        let paris = index.place(PARIS_FR_ID).unwrap();
        assert_eq!(admin1_of(&index, paris, &walk), Some(IDF_ID));
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let mut builder = GazetteerBuilder::new();
        let mut a = place(1, "A", "XX", "ADM2", 0);
        let mut b = place(2, "B", "XX", "ADM2", 0);
        a.super_places = vec![PlaceReference::admin(PlaceId(2))];
        b.super_places = vec![PlaceReference::admin(PlaceId(1))];
        builder.add(a).unwrap();
        builder.add(b).unwrap();
        let index = builder.build();

        let walk = walk_ancestors(&index, PlaceId(1), 10);
        assert_eq!(walk.ancestors, vec![PlaceId(2)]);
        assert_eq!(
            walk.cycle,
            Some(AmbiguousCycle {
                from: PlaceId(2),
                to: PlaceId(1)
            })
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut builder = GazetteerBuilder::new();
        let mut a = place(1, "A", "XX", "ADM1", 0);
        a.super_places = vec![PlaceReference::admin(PlaceId(1))];
        builder.add(a).unwrap();
        let index = builder.build();

        let walk = walk_ancestors(&index, PlaceId(1), 10);
        assert!(walk.ancestors.is_empty());
        assert!(walk.cycle.is_some());
    }

    #[test]
    fn test_long_chain_is_depth_bounded() {
        let mut builder = GazetteerBuilder::new();
        for id in 1..=30 {
            let mut p = place(id, &format!("P{}", id), "XX", "ADM3", 0);
            p.super_places = vec![PlaceReference::admin(PlaceId(id + 1))];
            builder.add(p).unwrap();
        }
        let index = builder.build();

        let walk = walk_ancestors(&index, PlaceId(1), 10);
        assert_eq!(walk.ancestors.len(), 10);
        assert_eq!(walk.ancestors.last(), Some(&PlaceId(11)));
        assert!(walk.depth_limited);
    }

    #[test]
    fn test_non_admin_references_are_ignored() {
        let mut builder = GazetteerBuilder::new();
        let mut a = place(1, "A", "XX", "PPL", 0);
        a.super_places = vec![PlaceReference {
            target: PlaceId(2),
            is_administrative_parent: false,
        }];
        builder.add(a).unwrap();
        builder.add(place(2, "B", "XX", "ADM1", 0)).unwrap();
        let index = builder.build();

        assert!(walk_ancestors(&index, PlaceId(1), 10).ancestors.is_empty());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut builder = GazetteerBuilder::new();
        let mut a = place(1, "A", "XX", "PPL", 0);
        let mut b = place(2, "B", "XX", "ADM2", 0);
        let mut c = place(3, "C", "XX", "ADM2", 0);
        a.super_places = vec![PlaceReference::admin(PlaceId(2)), PlaceReference::admin(PlaceId(3))];
        b.super_places = vec![PlaceReference::admin(PlaceId(4))];
        c.super_places = vec![PlaceReference::admin(PlaceId(4))];
        builder.add(a).unwrap();
        builder.add(b).unwrap();
        builder.add(c).unwrap();
        builder.add(place(4, "D", "XX", "ADM1", 0)).unwrap();
        let index = builder.build();

        let walk = walk_ancestors(&index, PlaceId(1), 10);
        assert_eq!(walk.ancestors, vec![PlaceId(2), PlaceId(3), PlaceId(4)]);
        assert!(walk.cycle.is_none());
    }

    #[test]
    fn test_short_branch_reaches_past_long_branch() {
        let mut builder = GazetteerBuilder::new();
        let mut start = place(1, "Start", "XX", "PPL", 0);
        start.super_places = vec![PlaceReference::admin(PlaceId(2)), PlaceReference::admin(PlaceId(20))];
        builder.add(start).unwrap();
        for id in 2..=10 {
            let mut p = place(id, &format!("L{}", id), "XX", "ADM3", 0);
            let next = if id == 10 { 50 } else { id + 1 };
            p.super_places = vec![PlaceReference::admin(PlaceId(next))];
            builder.add(p).unwrap();
        }
        let mut short = place(20, "Short", "XX", "ADM3", 0);
        short.super_places = vec![PlaceReference::admin(PlaceId(50))];
        builder.add(short).unwrap();
        let mut shared = place(50, "Shared", "XX", "ADM2", 0);
        shared.super_places = vec![PlaceReference::admin(PlaceId(60))];
        builder.add(shared).unwrap();
        builder.add(place(60, "Region", "XX", "ADM1", 0)).unwrap();
        let index = builder.build();

        let walk = walk_ancestors(&index, PlaceId(1), 10);
        assert!(walk.contains(PlaceId(60)));
        assert!(walk.contains(PlaceId(10)));
        assert!(!walk.depth_limited);
        assert!(walk.cycle.is_none());

        let start = index.place(PlaceId(1)).unwrap();
        assert_eq!(admin1_of(&index, start, &walk), Some(PlaceId(60)));
    }

    #[test]
    fn test_admin1_prefers_fewest_hops() {
        let mut builder = GazetteerBuilder::new();
        let mut a = place(1, "A", "XX", "PPL", 0);
        let mut deep = place(2, "Deep", "XX", "ADM2", 0);
        a.super_places = vec![PlaceReference::admin(PlaceId(2)), PlaceReference::admin(PlaceId(4))];
        deep.super_places = vec![PlaceReference::admin(PlaceId(3))];
        builder.add(a).unwrap();
        builder.add(deep).unwrap();
        builder.add(place(3, "Far", "XX", "ADM1", 0)).unwrap();
        builder.add(place(4, "Near", "XX", "ADM1", 0)).unwrap();
        let index = builder.build();

        let walk = walk_ancestors(&index, PlaceId(1), 10);
        assert_eq!(walk.ancestors, vec![PlaceId(2), PlaceId(4), PlaceId(3)]);
        let a = index.place(PlaceId(1)).unwrap();
        assert_eq!(admin1_of(&index, a, &walk), Some(PlaceId(4)));
    }
}
