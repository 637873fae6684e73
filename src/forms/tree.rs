//! The partial-answer entry tree.
//!
//! The tree is built incrementally as the user answers form questions.
//! Conditional properties evaluate expressions against earlier answers
//! while the tree is still under construction, so [`EntryTree::combined`]
//! can be called at any point to fold the result accumulated so far.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]; adoption writes
//! the child's parent slot, which must be empty, so a node can appear in
//! the tree exactly once. Three node kinds exist:
//!
//! - Object: holds a JSON map; merges child maps under its single key, or
//!   wraps a lone array child under it
//! - Key: holds a string used as a map key; wraps child objects under it
//! - Array: holds a list; appends child values, always a leaf in practice

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Handle to a node in an [`EntryTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
    Object { map: Map<String, Value>, array_mode: bool },
    Key(String),
    Array(Vec<Value>),
}

/// Payload-free view of a node kind, used while checking adoption rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Object,
    Key,
    Array,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of entry nodes forming the partial answer tree.
#[derive(Debug, Default)]
pub(crate) struct EntryTree {
    nodes: Vec<Node>,
}

impl EntryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unparented object node holding the given map.
    pub fn object(&mut self, map: Map<String, Value>) -> NodeId {
        self.push(NodeKind::Object {
            map,
            array_mode: false,
        })
    }

    /// Creates an unparented key node holding the given map key.
    pub fn key(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Key(name.to_string()))
    }

    /// Creates an unparented array node holding the given items.
    pub fn array(&mut self, items: Vec<Value>) -> NodeId {
        self.push(NodeKind::Array(items))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });

        NodeId(self.nodes.len() - 1)
    }

    fn kind_of(&self, id: NodeId) -> Kind {
        match self.nodes[id.0].kind {
            NodeKind::Object { .. } => Kind::Object,
            NodeKind::Key(_) => Kind::Key,
            NodeKind::Array(_) => Kind::Array,
        }
    }

    /// Adopts `child` under `parent`, enforcing the single-parent invariant
    /// and the per-kind child type rules. Returns the child id so adoption
    /// chains read naturally at call sites.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        if self.nodes[child.0].parent.is_some() {
            return Err(Error::Tree("parent already set".to_string()));
        }

        match (self.kind_of(parent), self.kind_of(child)) {
            (Kind::Object, Kind::Object) | (Kind::Object, Kind::Key) => {}

            (Kind::Object, Kind::Array) => {
                if !self.nodes[parent.0].children.is_empty() {
                    return Err(Error::Tree("only one array child is supported".to_string()));
                }
                if let NodeKind::Object { array_mode, .. } = &mut self.nodes[parent.0].kind {
                    *array_mode = true;
                }
            }

            (Kind::Key, Kind::Object) => {}
            (Kind::Key, _) => {
                return Err(Error::Tree(
                    "incompatible type, only object child values are supported".to_string(),
                ));
            }

            (Kind::Array, _) => {
                return Err(Error::Tree("incompatible child type".to_string()));
            }
        }

        if let NodeKind::Object { map, .. } = &self.nodes[parent.0].kind {
            if map.len() > 1 {
                return Err(Error::Tree(
                    "object entry with children must hold exactly one key".to_string(),
                ));
            }
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);

        Ok(child)
    }

    /// Replaces the node's value. The value must match the node kind.
    pub fn set(&mut self, id: NodeId, value: Value) -> Result<()> {
        match (&mut self.nodes[id.0].kind, value) {
            (NodeKind::Object { map, .. }, Value::Object(m)) => *map = m,
            (NodeKind::Key(k), Value::String(s)) => *k = s,
            (NodeKind::Array(items), Value::Array(a)) => *items = a,
            _ => return Err(Error::Tree("incompatible value".to_string())),
        }

        Ok(())
    }

    /// Folds the subtree rooted at `id` into its combined value. Pure and
    /// safe to call while the tree is still being built. The boolean
    /// reports whether the node carries a usable value; arrays are unset
    /// while empty.
    pub fn combined(&self, id: NodeId) -> (bool, Value) {
        let node = &self.nodes[id.0];

        match &node.kind {
            NodeKind::Object { map, array_mode } => {
                if node.children.is_empty() {
                    return (true, Value::Object(map.clone()));
                }

                let key = map.keys().next().cloned().unwrap_or_default();

                if *array_mode {
                    let (is_set, value) = self.combined(node.children[0]);
                    let mut result = Map::new();
                    result.insert(key, value);
                    (is_set, Value::Object(result))
                } else {
                    let mut merged = Map::new();
                    for child in &node.children {
                        let (_, value) = self.combined(*child);
                        if let Value::Object(m) = value {
                            merged.extend(m);
                        }
                    }

                    if key.is_empty() {
                        (true, Value::Object(merged))
                    } else {
                        let mut result = Map::new();
                        result.insert(key, Value::Object(merged));
                        (true, Value::Object(result))
                    }
                }
            }

            NodeKind::Key(key) => {
                if node.children.len() == 1 {
                    let (_, value) = self.combined(node.children[0]);
                    let mut result = Map::new();
                    result.insert(key.clone(), value);
                    return (true, Value::Object(result));
                }

                let mut merged = Map::new();
                for child in &node.children {
                    let (is_set, value) = self.combined(*child);
                    if is_set {
                        if let Value::Object(m) = value {
                            merged.extend(m);
                        }
                    }
                }

                let mut result = Map::new();
                result.insert(key.clone(), Value::Object(merged));
                (true, Value::Object(result))
            }

            NodeKind::Array(items) => {
                let mut result = items.clone();
                for child in &node.children {
                    let (_, value) = self.combined(*child);
                    result.push(value);
                }

                (!result.is_empty(), Value::Array(result))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(tree: &mut EntryTree, value: Value) -> NodeId {
        match value {
            Value::Object(m) => tree.object(m),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn folds_a_nested_answer_tree() {
        let mut tree = EntryTree::new();
        let root = tree.object(Map::new());

        let listen = obj(&mut tree, json!({"listen": "localhost:-1"}));
        tree.add_child(root, listen).unwrap();

        let ln = obj(&mut tree, json!({"leafnode": null}));
        tree.add_child(root, ln).unwrap();
        let creds = obj(&mut tree, json!({"credentials": "/x.cred"}));
        tree.add_child(ln, creds).unwrap();
        let url = obj(&mut tree, json!({"url": "connect.example.net:4222"}));
        tree.add_child(ln, url).unwrap();
        let urls = obj(&mut tree, json!({"urls": []}));
        tree.add_child(ln, urls).unwrap();
        let url_items = tree.array(vec![json!("x"), json!("y")]);
        tree.add_child(urls, url_items).unwrap();

        let accounts = obj(&mut tree, json!({"accounts": null}));
        tree.add_child(root, accounts).unwrap();
        let users = tree.key("USERS");
        tree.add_child(accounts, users).unwrap();
        let uc = obj(&mut tree, json!({"users": []}));
        tree.add_child(users, uc).unwrap();
        let user_items = tree.array(vec![
            json!({"username": "bob", "password": "b0b"}),
            json!({"username": "jill", "password": "j1ll"}),
        ]);
        tree.add_child(uc, user_items).unwrap();

        let (_, value) = tree.combined(root);
        assert_eq!(
            value,
            json!({
                "accounts": {
                    "USERS": {
                        "users": [
                            {"username": "bob", "password": "b0b"},
                            {"username": "jill", "password": "j1ll"},
                        ],
                    },
                },
                "leafnode": {
                    "credentials": "/x.cred",
                    "url": "connect.example.net:4222",
                    "urls": ["x", "y"],
                },
                "listen": "localhost:-1",
            })
        );
    }

    #[test]
    fn rejects_a_second_adoption() {
        let mut tree = EntryTree::new();
        let a = tree.object(Map::new());
        let b = tree.object(Map::new());
        let child = obj(&mut tree, json!({"k": 1}));

        tree.add_child(a, child).unwrap();
        let err = tree.add_child(b, child).unwrap_err();
        assert_eq!(err.to_string(), "parent already set");
    }

    #[test]
    fn key_nodes_only_accept_objects() {
        let mut tree = EntryTree::new();
        let key = tree.key("name");
        let arr = tree.array(vec![]);

        let err = tree.add_child(key, arr).unwrap_err();
        assert!(err.to_string().contains("only object child values"));
    }

    #[test]
    fn array_nodes_are_terminal() {
        let mut tree = EntryTree::new();
        let arr = tree.array(vec![]);
        let child = tree.object(Map::new());

        let err = tree.add_child(arr, child).unwrap_err();
        assert_eq!(err.to_string(), "incompatible child type");
    }

    #[test]
    fn objects_accept_one_array_child_and_only_alone() {
        let mut tree = EntryTree::new();
        let holder = obj(&mut tree, json!({"items": []}));
        let first = obj(&mut tree, json!({"x": 1}));
        tree.add_child(holder, first).unwrap();

        let arr = tree.array(vec![json!(1)]);
        let err = tree.add_child(holder, arr).unwrap_err();
        assert_eq!(err.to_string(), "only one array child is supported");
    }

    #[test]
    fn array_mode_wraps_the_child_under_the_key() {
        let mut tree = EntryTree::new();
        let holder = obj(&mut tree, json!({"items": []}));
        let arr = tree.array(vec![json!("a"), json!("b")]);
        tree.add_child(holder, arr).unwrap();

        let (is_set, value) = tree.combined(holder);
        assert!(is_set);
        assert_eq!(value, json!({"items": ["a", "b"]}));
    }

    #[test]
    fn rejects_ambiguous_multi_key_objects() {
        let mut tree = EntryTree::new();
        let parent = obj(&mut tree, json!({"a": 1, "b": 2}));
        let child = obj(&mut tree, json!({"c": 3}));

        let err = tree.add_child(parent, child).unwrap_err();
        assert!(err.to_string().contains("exactly one key"));
    }

    #[test]
    fn set_is_type_checked() {
        let mut tree = EntryTree::new();
        let o = tree.object(Map::new());
        let k = tree.key("k");
        let a = tree.array(vec![]);

        assert!(tree.set(o, json!({"x": 1})).is_ok());
        assert!(tree.set(o, json!("nope")).is_err());
        assert!(tree.set(k, json!("renamed")).is_ok());
        assert!(tree.set(k, json!(["nope"])).is_err());
        assert!(tree.set(a, json!([1, 2])).is_ok());
        assert!(tree.set(a, json!({"nope": 1})).is_err());
    }

    #[test]
    fn empty_arrays_are_unset() {
        let mut tree = EntryTree::new();
        let a = tree.array(vec![]);
        let (is_set, value) = tree.combined(a);
        assert!(!is_set);
        assert_eq!(value, json!([]));
    }
}
