use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::{Error, Participant, ParticipantId, ParticipantStore, ParticipantStoreExt, Position};

/// Roll-up statistics of a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    node_count: u64,
    value_sum: Decimal,
    height: u32,
}

impl Stats {
    fn single(participant: &Participant) -> Self {
        Self {
            node_count: 1,
            value_sum: participant.value_or_zero(),
            height: 0,
        }
    }

    fn absorb(&mut self, child: &Self) -> crate::Result<()> {
        self.node_count = self
            .node_count
            .checked_add(child.node_count)
            .ok_or(Error::Computation("node count overflow"))?;
        self.value_sum = self
            .value_sum
            .checked_add(child.value_sum)
            .ok_or(Error::Computation("value sum overflow"))?;
        self.height = self.height.max(child.height.saturating_add(1));
        Ok(())
    }

    /// Get the number of nodes, including the subtree root.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Get the sum of the values of all nodes.
    pub fn value_sum(&self) -> &Decimal {
        &self.value_sum
    }

    /// Get the number of levels below the subtree root.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Shape of a subtree. Children are ordered left before right.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeSnapshot {
    participant: Participant,
    stats: Stats,
    children: Vec<TreeSnapshot>,
}

impl TreeSnapshot {
    /// Get the participant at this node.
    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// Get the statistics of the subtree rooted here.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Get the child snapshots.
    pub fn children(&self) -> &[TreeSnapshot] {
        &self.children
    }

    /// Get the child snapshot on the given side.
    pub fn child(&self, position: Position) -> Option<&TreeSnapshot> {
        self.children
            .iter()
            .find(|child| child.participant.position() == Some(position))
    }

    /// Pre-order iteration over the subtree, yielding the depth relative to this node.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TreeSnapshot)> {
        let mut stack = vec![(0, self)];
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
            Some((depth, node))
        })
    }
}

/// Result of [`build_subtree`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubtreeReport {
    tree: TreeSnapshot,
    stats: Stats,
}

impl SubtreeReport {
    /// Get the tree snapshot.
    pub fn tree(&self) -> &TreeSnapshot {
        &self.tree
    }

    /// Get the statistics of the whole subtree.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Get the statistics of the leg below the root on the given side.
    ///
    /// Returns empty statistics if the slot is free.
    pub fn leg(&self, position: Position) -> Stats {
        self.tree
            .child(position)
            .map(|child| child.stats)
            .unwrap_or_default()
    }

    /// Consume the report.
    pub fn into_parts(self) -> (TreeSnapshot, Stats) {
        (self.tree, self.stats)
    }
}

/// Walks subtrees and rolls up their statistics.
///
/// Children are fetched one level at a time, so a traversal costs one store
/// call per level.
#[derive(Debug)]
pub struct Aggregator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: ParticipantStore + ?Sized> Aggregator<'a, S> {
    /// Create an aggregator over the given store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Build the snapshot and statistics of the subtree rooted at `root`.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if `root` does not exist.
    /// - [`Error::StoreUnavailable`] if the store fails; no partial result is returned.
    /// - [`Error::Cycle`] if a participant is reached twice.
    pub fn build_subtree(&self, root: ParticipantId) -> crate::Result<SubtreeReport> {
        let levels = self.fetch_levels(root)?;
        let mut pending = HashMap::<ParticipantId, Vec<TreeSnapshot>>::new();
        let mut tree = None;
        for level in levels.into_iter().rev() {
            for participant in level {
                let mut children = pending.remove(&participant.id()).unwrap_or_default();
                children.sort_by_key(|child| child.participant.position());
                let mut stats = Stats::single(&participant);
                for child in children.iter() {
                    stats.absorb(&child.stats)?;
                }
                let parent = participant.parent_id();
                let snapshot = TreeSnapshot {
                    participant,
                    stats,
                    children,
                };
                match parent {
                    Some(parent) if snapshot.participant.id() != root => {
                        pending.entry(parent).or_default().push(snapshot);
                    }
                    _ => tree = Some(snapshot),
                }
            }
        }
        let tree = tree.ok_or(Error::Computation("subtree root is missing"))?;
        tracing::debug!(
            %root,
            node_count = tree.stats.node_count,
            value_sum = %tree.stats.value_sum,
            "built subtree"
        );
        Ok(SubtreeReport {
            stats: tree.stats,
            tree,
        })
    }

    fn fetch_levels(&self, root: ParticipantId) -> crate::Result<Vec<Vec<Participant>>> {
        let root = self.store.get(root)?;
        let mut visited = HashSet::from([root.id()]);
        let mut levels = vec![vec![root]];
        loop {
            let parents = levels
                .last()
                .map(|level| level.iter().map(Participant::id).collect::<Vec<_>>())
                .unwrap_or_default();
            let children = self.store.children_of(&parents)?;
            if children.is_empty() {
                break;
            }
            for child in children.iter() {
                if !visited.insert(child.id()) {
                    return Err(Error::Cycle(child.id()));
                }
            }
            tracing::trace!(depth = levels.len(), len = children.len(), "fetched level");
            levels.push(children);
        }
        Ok(levels)
    }
}

/// Build the snapshot and statistics of the subtree rooted at `root`.
pub fn build_subtree<S: ParticipantStore + ?Sized>(
    store: &S,
    root: ParticipantId,
) -> crate::Result<SubtreeReport> {
    Aggregator::new(store).build_subtree(root)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test::{CyclicStore, FailingStore, TestNetwork};

    #[test]
    fn four_node_scenario() -> crate::Result<()> {
        let mut net = TestNetwork::default();
        let r = net.root_with_value("R", dec!(100))?;
        let l = net.child_with_value("L", r, Position::Left, dec!(50))?;
        let m = net.child_with_value("M", r, Position::Right, dec!(30))?;
        net.child_with_value("N", m, Position::Left, dec!(20))?;

        let report = build_subtree(net.store(), r)?;
        assert_eq!(report.stats().node_count(), 4);
        assert_eq!(*report.stats().value_sum(), dec!(200));
        assert_eq!(report.stats().height(), 2);

        let children = report.tree().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].participant().id(), l);
        assert_eq!(children[1].participant().id(), m);

        assert_eq!(report.leg(Position::Left).node_count(), 1);
        assert_eq!(*report.leg(Position::Left).value_sum(), dec!(50));
        assert_eq!(report.leg(Position::Right).node_count(), 2);
        assert_eq!(*report.leg(Position::Right).value_sum(), dec!(50));
        Ok(())
    }

    #[test]
    fn absent_values_count_as_zero() -> crate::Result<()> {
        let mut net = TestNetwork::default();
        let r = net.root("R")?;
        let a = net.child_with_value("A", r, Position::Right, dec!(7.25))?;
        net.child("B", a, Position::Right)?;
        let report = build_subtree(net.store(), r)?;
        assert_eq!(report.stats().node_count(), 3);
        assert_eq!(*report.stats().value_sum(), dec!(7.25));
        assert_eq!(report.leg(Position::Left), Stats::default());
        Ok(())
    }

    #[test]
    fn inner_node_as_root() -> crate::Result<()> {
        let mut net = TestNetwork::default();
        let r = net.root_with_value("R", dec!(1))?;
        let a = net.child_with_value("A", r, Position::Left, dec!(2))?;
        net.child_with_value("B", a, Position::Right, dec!(3))?;
        let report = build_subtree(net.store(), a)?;
        assert_eq!(report.tree().participant().id(), a);
        assert_eq!(report.stats().node_count(), 2);
        assert_eq!(*report.stats().value_sum(), dec!(5));
        Ok(())
    }

    #[test]
    fn iteration_is_pre_order_left_first() -> crate::Result<()> {
        let mut net = TestNetwork::default();
        let r = net.root("R")?;
        let b = net.child("B", r, Position::Right)?;
        let a = net.child("A", r, Position::Left)?;
        let c = net.child("C", a, Position::Right)?;
        let report = build_subtree(net.store(), r)?;
        let order = report
            .tree()
            .iter()
            .map(|(depth, node)| (depth, node.participant().id()))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(0, r), (1, a), (2, c), (1, b)]);
        Ok(())
    }

    #[test]
    fn deep_column_does_not_recurse() -> crate::Result<()> {
        let mut net = TestNetwork::default();
        let r = net.root("R")?;
        net.chain(r, Position::Left, 3_000)?;
        let report = build_subtree(net.store(), r)?;
        assert_eq!(report.stats().node_count(), 3_001);
        assert_eq!(report.stats().height(), 3_000);
        let (tree, stats) = report.into_parts();
        assert_eq!(tree.iter().count() as u64, stats.node_count());
        Ok(())
    }

    #[test]
    fn missing_root_is_not_found() {
        let net = TestNetwork::default();
        assert_eq!(
            build_subtree(net.store(), ParticipantId::new(1)),
            Err(Error::not_found(ParticipantId::new(1)))
        );
    }

    #[test]
    fn store_failure_aborts_traversal() -> crate::Result<()> {
        let mut net = TestNetwork::default();
        let r = net.root("R")?;
        let a = net.child("A", r, Position::Left)?;
        net.child("B", a, Position::Left)?;
        // Root lookup and the first level succeed, the second level fails.
        let failing = FailingStore::new(net.store(), 2);
        assert!(matches!(
            build_subtree(&failing, r),
            Err(Error::StoreUnavailable(_))
        ));
        Ok(())
    }

    #[test]
    fn looping_children_are_a_cycle() {
        let store = CyclicStore::default();
        assert_eq!(
            build_subtree(&store, store.a()).err(),
            Some(Error::Cycle(store.a()))
        );
        assert_eq!(
            build_subtree(&store, store.b()).err(),
            Some(Error::Cycle(store.b()))
        );
    }
}
