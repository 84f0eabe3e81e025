//! Ancestor-chain maintenance for category and family trees

use crate::{Error, Result};
use mdm_ir::{Category, EntityId, Family, HierarchyNode};
use mdm_store::Repository;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Storage access for one kind of tree node
pub(crate) trait StoredNode: HierarchyNode + Clone {
    async fn load<R: Repository>(repo: &R, id: &EntityId) -> mdm_store::Result<Option<Self>>;
    async fn list<R: Repository>(repo: &R) -> mdm_store::Result<Vec<Self>>;
    async fn store<R: Repository>(repo: &R, node: Self) -> mdm_store::Result<()>;
}

impl StoredNode for Category {
    async fn load<R: Repository>(repo: &R, id: &EntityId) -> mdm_store::Result<Option<Self>> {
        repo.find_category(id).await
    }

    async fn list<R: Repository>(repo: &R) -> mdm_store::Result<Vec<Self>> {
        repo.list_categories().await
    }

    async fn store<R: Repository>(repo: &R, node: Self) -> mdm_store::Result<()> {
        repo.save_category(node).await
    }
}

impl StoredNode for Family {
    async fn load<R: Repository>(repo: &R, id: &EntityId) -> mdm_store::Result<Option<Self>> {
        repo.find_family(id).await
    }

    async fn list<R: Repository>(repo: &R) -> mdm_store::Result<Vec<Self>> {
        repo.list_families().await
    }

    async fn store<R: Repository>(repo: &R, node: Self) -> mdm_store::Result<()> {
        repo.save_family(node).await
    }
}

/// Ancestor chain for a node placed under `parent`
///
/// Root-first, excluding the node itself: `parent.ancestors ++ [parent]`.
pub(crate) async fn compute_ancestors<N, R>(
    repo: &R,
    node_id: &EntityId,
    parent: Option<&EntityId>,
) -> Result<Vec<EntityId>>
where
    N: StoredNode,
    R: Repository,
{
    let Some(parent_id) = parent else {
        return Ok(Vec::new());
    };
    if parent_id == node_id {
        return Err(Error::CycleDetected {
            entity: N::KIND,
            id: node_id.clone(),
        });
    }

    let parent = N::load(repo, parent_id)
        .await?
        .ok_or_else(|| Error::ParentNotFound {
            entity: N::KIND,
            id: parent_id.clone(),
        })?;
    if parent.ancestors().contains(node_id) {
        return Err(Error::CycleDetected {
            entity: N::KIND,
            id: node_id.clone(),
        });
    }

    let mut ancestors = parent.ancestors().to_vec();
    ancestors.push(parent_id.clone());
    Ok(ancestors)
}

/// Recompute the ancestor chains of every descendant of `root`
///
/// `root` must already carry its new chain. Returns the number of
/// descendants rewritten.
pub(crate) async fn propagate_ancestors<N, R>(repo: &R, root: &N) -> Result<usize>
where
    N: StoredNode,
    R: Repository,
{
    let mut descendants: Vec<N> = N::list(repo)
        .await?
        .into_iter()
        .filter(|node| node.ancestors().contains(root.id()))
        .collect();
    // Shallow nodes first, so every parent's chain is final before its children
    descendants.sort_by_key(|node| node.ancestors().len());

    let mut chains: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
    chains.insert(root.id().clone(), root.ancestors().to_vec());

    let mut rewritten = 0;
    for mut node in descendants {
        let Some(parent_id) = node.parent().cloned() else {
            continue;
        };
        let Some(parent_chain) = chains.get(&parent_id) else {
            continue;
        };

        let mut chain = parent_chain.clone();
        chain.push(parent_id);
        chains.insert(node.id().clone(), chain.clone());

        if node.ancestors() != chain.as_slice() {
            node.set_ancestors(chain);
            N::store(repo, node).await?;
            rewritten += 1;
        }
    }

    if rewritten > 0 {
        debug!("Recomputed ancestors for {} descendants of {}", rewritten, root.id());
    }
    Ok(rewritten)
}

/// Order nodes so every parent comes before its children
///
/// Nodes whose parent is outside the input count as roots. Nodes caught in a
/// parent cycle are appended last in input order, so the write that follows
/// reports the cycle.
pub(crate) fn parents_first<N: HierarchyNode + Clone>(nodes: &[N]) -> Vec<N> {
    let present: HashSet<&EntityId> = nodes.iter().map(HierarchyNode::id).collect();
    let mut placed: HashSet<&EntityId> = HashSet::new();
    let mut ordered = Vec::with_capacity(nodes.len());
    let mut pending: Vec<&N> = nodes.iter().collect();

    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|node| {
            let ready = node
                .parent()
                .is_none_or(|p| !present.contains(p) || placed.contains(p));
            if ready {
                placed.insert(node.id());
                ordered.push((*node).clone());
            }
            !ready
        });
        if pending.len() == before {
            ordered.extend(pending.drain(..).cloned());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parents_first_orders_by_depth() {
        let nodes = vec![
            Category::new("c", "c", "C").with_parent("b"),
            Category::new("b", "b", "B").with_parent("a"),
            Category::new("a", "a", "A"),
            Category::new("x", "x", "X").with_parent("outside"),
        ];

        let ordered: Vec<String> = parents_first(&nodes)
            .iter()
            .map(|c| c.code.clone())
            .collect();
        assert_eq!(ordered, vec!["a", "x", "b", "c"]);
    }

    #[test]
    fn test_parents_first_keeps_cycles() {
        let nodes = vec![
            Category::new("a", "a", "A").with_parent("b"),
            Category::new("b", "b", "B").with_parent("a"),
        ];
        assert_eq!(parents_first(&nodes).len(), 2);
    }
}
