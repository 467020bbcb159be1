use crate::dom::{Dom, MutationRecord, NodeId};

/// Whether a mutation batch only touched the panel's own subtree
///
/// Returns `false` when no panel is mounted. A record is panel-local when its
/// target is the panel root or inside it, or when every node it touches is.
/// Removed nodes are no longer inside the panel once detached, which is why the
/// record target counts too. One non-local record makes the batch qualifying.
///
/// `contains(ancestor, node)` is inclusive containment.
pub fn is_panel_only_change<F>(batch: &[MutationRecord], panel_root: Option<NodeId>, contains: F) -> bool
where
    F: Fn(NodeId, NodeId) -> bool,
{
    let Some(root) = panel_root else {
        return false;
    };

    let inside = |node: NodeId| node == root || contains(root, node);

    batch
        .iter()
        .all(|record| inside(record.target) || record.touched_nodes().into_iter().all(inside))
}

/// [`is_panel_only_change`] with containment answered by a document
pub fn is_panel_only_change_in<D: Dom + ?Sized>(dom: &D, batch: &[MutationRecord], panel_root: Option<NodeId>) -> bool {
    is_panel_only_change(batch, panel_root, |ancestor, node| dom.contains(ancestor, node))
}
