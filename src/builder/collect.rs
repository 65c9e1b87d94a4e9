//! Transitive dependency collection.
//!
//! A depth-first walk over a dependency graph that flattens it into a list
//! where every reachable node appears exactly once, in pre-order. Nodes are
//! tracked in a tri-state map keyed by their identity:
//!
//! - absent: not visited yet
//! - `InProgress`: on the current walk stack
//! - `Done`: fully expanded
//!
//! Reaching an `InProgress` node means the graph has a cycle. Reaching a
//! `Done` node (a diamond) is a no-op. The walk is generic over the node
//! type and its identity so it does not care what a "library" is.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Visit state of a node during collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    InProgress,
    Done,
}

/// A cycle was found while collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError<K> {
    /// The node that was reached while still in progress.
    pub key: K,
    /// The walk from the first occurrence of `key` back to `key`.
    pub chain: Vec<K>,
}

impl<K: fmt::Debug> fmt::Display for CycleError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency cycle detected at {:?}", self.key)
    }
}

impl<K: fmt::Debug> std::error::Error for CycleError<K> {}

struct Walk<'f, N, K, E> {
    key: &'f dyn Fn(&N) -> K,
    children: &'f dyn Fn(&N) -> Result<Vec<N>, E>,
    states: HashMap<K, VisitState>,
    stack: Vec<K>,
    out: Vec<N>,
}

impl<N, K, E> Walk<'_, N, K, E>
where
    K: Eq + Hash + Clone + fmt::Debug,
    E: From<CycleError<K>>,
{
    fn visit(&mut self, node: N) -> Result<(), E> {
        let key = (self.key)(&node);

        match self.states.get(&key) {
            Some(VisitState::InProgress) => {
                let start = self.stack.iter().position(|k| *k == key).unwrap_or(0);
                let mut chain = self.stack[start..].to_vec();
                chain.push(key.clone());
                return Err(CycleError { key, chain }.into());
            }
            Some(VisitState::Done) => {
                tracing::trace!("already collected {:?}", key);
                return Ok(());
            }
            None => {}
        }

        tracing::trace!("collecting {:?}", key);
        self.states.insert(key.clone(), VisitState::InProgress);
        self.stack.push(key.clone());

        let children = (self.children)(&node)?;
        self.out.push(node);
        for child in children {
            self.visit(child)?;
        }

        self.stack.pop();
        self.states.insert(key, VisitState::Done);
        Ok(())
    }
}

/// Collect every node reachable from `start`, each exactly once, in pre-order.
///
/// `root` is the identity of the node the walk is performed for. It is
/// considered in progress for the whole walk, so reaching it again is a
/// cycle, and it never appears in the result. Nodes in `start` are walked in
/// order, each fully before the next.
pub fn collect<N, K, E>(
    root: K,
    start: impl IntoIterator<Item = N>,
    key: &dyn Fn(&N) -> K,
    children: &dyn Fn(&N) -> Result<Vec<N>, E>,
) -> Result<Vec<N>, E>
where
    K: Eq + Hash + Clone + fmt::Debug,
    E: From<CycleError<K>>,
{
    let mut walk = Walk {
        key,
        children,
        states: HashMap::new(),
        stack: vec![root.clone()],
        out: Vec::new(),
    };
    walk.states.insert(root, VisitState::InProgress);

    for node in start {
        walk.visit(node)?;
    }

    Ok(walk.out)
}
