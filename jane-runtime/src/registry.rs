//! The registry of named references.
//!
//! References form a tree: a reference whose upstream is registered hangs
//! below the upstream's node, every other reference below a synthetic root.
//! Removing a reference removes its whole subtree.
//!
//! The registry is itself an event source. It announces additions, removals
//! and selections, and relays every event posted by a registered reference
//! to its own subscribers.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use jane_types::constants::ROOT_NODE_NAME;
use rustc_hash::FxHashMap;

use crate::contract::Contract;
use crate::events::DataEvent;
use crate::pubsub::{EventSource, EventSubscriber, FnSubscriber, Publisher, SubscriberId};
use crate::reference::Reference;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Name of the synthetic root node and of the registry as a source.
    pub root_name: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            root_name: ROOT_NODE_NAME.to_string(),
        }
    }
}

type NodeId = usize;

#[derive(Debug)]
struct Node {
    name: String,
    depth: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    reference: Option<Rc<Reference>>,
}

#[derive(Debug)]
struct RegistryTree {
    nodes: FxHashMap<NodeId, Node>,
    index: FxHashMap<String, NodeId>,
    root: NodeId,
    next_id: NodeId,
    depth: usize,
}

impl RegistryTree {
    fn new(root_name: &str) -> Self {
        let mut tree = Self {
            nodes: FxHashMap::default(),
            index: FxHashMap::default(),
            root: 0,
            next_id: 0,
            depth: 0,
        };
        tree.root = tree.insert(root_name.to_string(), None, None);
        tree
    }

    fn insert(
        &mut self,
        name: String,
        parent: Option<NodeId>,
        reference: Option<Rc<Reference>>,
    ) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        let depth = parent
            .and_then(|p| self.nodes.get(&p))
            .map_or(0, |p| p.depth + 1);
        self.depth = self.depth.max(depth);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
        self.index.insert(name.clone(), id);
        self.nodes.insert(
            id,
            Node {
                name,
                depth,
                parent,
                children: Vec::new(),
                reference,
            },
        );
        id
    }

    /// Unlink `id` and every descendant. Returns the removed references,
    /// descendants before ancestors.
    fn remove_subtree(&mut self, id: NodeId) -> Vec<Rc<Reference>> {
        let mut removed = Vec::new();
        let children = self
            .nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            removed.extend(self.remove_subtree(child));
        }

        if let Some(node) = self.nodes.remove(&id) {
            if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
                parent.children.retain(|c| *c != id);
            }
            self.index.remove(&node.name);
            removed.extend(node.reference);
        }
        removed
    }
}

pub struct Registry {
    options: RegistryOptions,
    publisher: Publisher,
    monitor: Rc<dyn EventSubscriber>,
    tree: RefCell<RegistryTree>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("options", &self.options)
            .field("references", &self.names())
            .field("depth", &self.depth())
            .finish()
    }
}

impl EventSource for Registry {
    fn source_name(&self) -> &str {
        &self.options.root_name
    }

    fn publisher(&self) -> &Publisher {
        &self.publisher
    }
}

impl Registry {
    pub fn new() -> Rc<Self> {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Registry>| {
            let owner: Weak<dyn EventSource> = this.clone();
            let registry = this.clone();
            let monitor = FnSubscriber::new(
                format!("{}.monitor", options.root_name),
                move |source: &dyn EventSource, event: &DataEvent| {
                    if let Some(registry) = registry.upgrade() {
                        tracing::trace!(
                            "[REGISTRY] relaying {} from {}",
                            event,
                            source.source_name()
                        );
                        registry.post_event(event.clone());
                    }
                },
            );
            Registry {
                tree: RefCell::new(RegistryTree::new(&options.root_name)),
                options,
                publisher: Publisher::new(owner),
                monitor,
            }
        })
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Subscribe to registry announcements and relayed reference events.
    pub fn add_subscriber(&self, subscriber: Rc<dyn EventSubscriber>) -> bool {
        self.publisher.add_subscriber(subscriber, Contract::read_only())
    }

    pub fn remove_subscriber(&self, id: SubscriberId) -> bool {
        self.publisher.remove_subscriber(id)
    }

    fn post_event(&self, event: DataEvent) {
        self.publisher.post(self, &event);
    }

    /// Register `reference` under its name. Returns `None` and changes
    /// nothing when the name is taken.
    pub fn add_data_reference(&self, reference: &Rc<Reference>) -> Option<Rc<Reference>> {
        let name = reference.name().to_string();
        {
            let mut tree = self.tree.borrow_mut();
            if tree.index.contains_key(&name) {
                tracing::debug!("[REGISTRY] {} already registered", name);
                return None;
            }
            let parent = reference
                .upstream()
                .and_then(|up| tree.index.get(up.name()).copied())
                .unwrap_or(tree.root);
            let id = tree.insert(name.clone(), Some(parent), Some(Rc::clone(reference)));
            tracing::debug!(
                "[REGISTRY] added {} at depth {}",
                name,
                tree.nodes.get(&id).map_or(0, |n| n.depth)
            );
        }
        reference.add_subscriber_read_only(Rc::clone(&self.monitor));
        self.post_event(DataEvent::ReferenceAdded(name));
        Some(Rc::clone(reference))
    }

    /// Flush and unregister `reference` together with every reference
    /// registered below it. Returns `false` when the name is not registered.
    pub fn remove_data_reference(&self, reference: &Reference) -> bool {
        self.remove_by_name(reference.name())
    }

    /// [`Registry::remove_data_reference`] by name.
    pub fn remove_by_name(&self, name: &str) -> bool {
        let node_reference = {
            let tree = self.tree.borrow();
            match tree.index.get(name).and_then(|id| tree.nodes.get(id)) {
                Some(node) if node.reference.is_some() => node.reference.clone(),
                _ => return false,
            }
        };
        if let Some(reference) = &node_reference {
            reference.flush();
        }

        let removed = {
            let mut tree = self.tree.borrow_mut();
            match tree.index.get(name).copied() {
                Some(id) => tree.remove_subtree(id),
                None => return false,
            }
        };

        for reference in &removed {
            reference.remove_subscriber(self.monitor.subscriber_id());
            reference.detach();
            tracing::debug!("[REGISTRY] removed {}", reference.name());
        }
        for reference in &removed {
            self.post_event(DataEvent::ReferenceRemoved(reference.name().to_string()));
        }
        true
    }

    pub fn get_data_reference(&self, name: &str) -> Option<Rc<Reference>> {
        let tree = self.tree.borrow();
        tree.index
            .get(name)
            .and_then(|id| tree.nodes.get(id))
            .and_then(|node| node.reference.clone())
    }

    /// Announce that the reference named `name` was selected by a consumer.
    pub fn select_data_reference(&self, name: &str) -> bool {
        if self.get_data_reference(name).is_none() {
            return false;
        }
        self.post_event(DataEvent::ReferenceSelected(name.to_string()));
        true
    }

    /// Remove every registered reference.
    pub fn reset(&self) {
        loop {
            let first = {
                let tree = self.tree.borrow();
                tree.nodes
                    .get(&tree.root)
                    .and_then(|root| root.children.first())
                    .and_then(|id| tree.nodes.get(id))
                    .map(|node| node.name.clone())
            };
            match first {
                Some(name) => {
                    if !self.remove_by_name(&name) {
                        break;
                    }
                }
                None => break,
            }
        }
        self.tree.borrow_mut().depth = 0;
    }

    /// Deepest node depth seen since the last reset; top-level references
    /// sit at depth 1.
    pub fn depth(&self) -> usize {
        self.tree.borrow().depth
    }

    /// Registered reference names in registration order.
    pub fn names(&self) -> Vec<String> {
        let tree = self.tree.borrow();
        let mut nodes: Vec<(&NodeId, &Node)> = tree
            .nodes
            .iter()
            .filter(|(_, n)| n.reference.is_some())
            .collect();
        nodes.sort_by_key(|(id, _)| **id);
        nodes.into_iter().map(|(_, n)| n.name.clone()).collect()
    }

    /// Names of references registered directly below `name`.
    pub fn children_of(&self, name: &str) -> Vec<String> {
        let tree = self.tree.borrow();
        tree.index
            .get(name)
            .and_then(|id| tree.nodes.get(id))
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|c| tree.nodes.get(c))
                    .map(|c| c.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tree.borrow().index.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
