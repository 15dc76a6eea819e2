//! Page tree reconstruction from flat, parent-referencing records.
//!
//! # Architecture
//!
//! Records are stored in a flat `Vec` with children tracked by indices,
//! built in one grouping pass:
//! - records are grouped by parent identity, keeping input order
//! - the group without a parent becomes the root list
//! - each record's children are the group keyed by its own identity
//!
//! Projection into nested output never touches the records. A record whose
//! parent is absent from the input is never reached from a root, so a
//! filtered-out ancestor drops its whole subtree.

use std::collections::HashMap;

use plinth_store::{Page, PageId};

/// A record that occupies a node of the page hierarchy.
pub trait TreeRecord {
    /// Identity of the page the record belongs to.
    fn node_id(&self) -> PageId;
    /// Identity of the parent page, `None` for roots.
    fn parent_id(&self) -> Option<PageId>;
}

impl TreeRecord for Page {
    fn node_id(&self) -> PageId {
        self.id
    }

    fn parent_id(&self) -> Option<PageId> {
        self.parent
    }
}

/// Arena of records with parent/children edges stored as indices.
#[derive(Debug)]
pub struct PageTree<T> {
    records: Vec<T>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<T: TreeRecord> PageTree<T> {
    /// Group `records` by parent identity.
    #[must_use]
    pub fn build(records: Vec<T>) -> Self {
        let mut groups: HashMap<Option<PageId>, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            groups.entry(record.parent_id()).or_default().push(idx);
        }

        let roots = groups.remove(&None).unwrap_or_default();
        let children = records
            .iter()
            .map(|record| {
                groups
                    .get(&Some(record.node_id()))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        Self {
            records,
            children,
            roots,
        }
    }

    /// Indices of root records in input order.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Indices of the children of the record at `idx`.
    #[must_use]
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Record at `idx`.
    #[must_use]
    pub fn record(&self, idx: usize) -> &T {
        &self.records[idx]
    }

    /// Number of records, reachable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the tree holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records reachable from a root, in depth-first pre-order.
    #[must_use]
    pub fn flatten(&self) -> Vec<&T> {
        fn visit<'a, T>(tree: &'a PageTree<T>, idx: usize, out: &mut Vec<&'a T>) {
            out.push(&tree.records[idx]);
            for &child in &tree.children[idx] {
                visit(tree, child, out);
            }
        }

        let mut out = Vec::with_capacity(self.records.len());
        for &root in &self.roots {
            visit(self, root, &mut out);
        }
        out
    }

    /// Project the reachable records into nested output nodes.
    ///
    /// `node` receives a record and its already projected children.
    pub fn project<N, F>(&self, mut node: F) -> Vec<N>
    where
        F: FnMut(&T, Vec<N>) -> N,
    {
        fn visit<T, N, F>(tree: &PageTree<T>, idx: usize, node: &mut F) -> N
        where
            F: FnMut(&T, Vec<N>) -> N,
        {
            let children = tree.children[idx]
                .iter()
                .map(|&child| visit(tree, child, node))
                .collect();
            node(&tree.records[idx], children)
        }

        self.roots
            .iter()
            .map(|&root| visit(self, root, &mut node))
            .collect()
    }
}
