use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ax::attribute::{self, AttrValue, ProcessId, ScalarValue};
use crate::ax::probe::AttributeProbe;
use crate::error::SteinError;
use crate::platform::process::{ActivationPolicy, PermissionOracle, ProcessRegistry, RunningProcess};

// ============================================================================
// Fixture file model (YAML)
// ============================================================================

/// An in-memory desktop: running processes, their accessibility trees and
/// the permission state. Loaded from YAML for the CLI, or built in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSpec {
    #[serde(default = "default_true")]
    pub permission_granted: bool,

    #[serde(default = "default_current_pid")]
    pub current_pid: ProcessId,

    #[serde(default)]
    pub processes: Vec<FixtureProcess>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureProcess {
    #[serde(flatten)]
    pub process: RunningProcess,

    /// Application root element; processes without one expose no tree.
    #[serde(default)]
    pub tree: Option<FixtureNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureNode {
    #[serde(default)]
    pub attributes: BTreeMap<String, ScalarValue>,

    /// Attributes the platform reports as writable.
    #[serde(default)]
    pub settable: Vec<String>,

    /// Writable attributes whose writes are accepted but never stick.
    #[serde(default)]
    pub sticky: Vec<String>,

    /// Owner override; defaults to the parent's owner.
    #[serde(default)]
    pub pid: Option<ProcessId>,

    /// Also reachable from the application root through this attribute
    /// (e.g. `AXMenuBar`).
    #[serde(default)]
    pub exposed_as: Option<String>,

    #[serde(default)]
    pub children: Vec<FixtureNode>,
}

fn default_true() -> bool { true }
fn default_current_pid() -> ProcessId { 1 }

impl FixtureSpec {
    pub fn new() -> Self {
        Self {
            permission_granted: true,
            current_pid: default_current_pid(),
            processes: Vec::new(),
        }
    }

    pub fn process(
        mut self,
        pid: ProcessId,
        bundle_id: &str,
        name: &str,
        activation_policy: ActivationPolicy,
        tree: Option<FixtureNode>,
    ) -> Self {
        self.processes.push(FixtureProcess {
            process: RunningProcess {
                pid,
                bundle_id: Some(bundle_id.to_string()),
                name: Some(name.to_string()),
                activation_policy,
                ui_element_only: false,
            },
            tree,
        });
        self
    }

    pub fn raw_process(mut self, process: RunningProcess, tree: Option<FixtureNode>) -> Self {
        self.processes.push(FixtureProcess { process, tree });
        self
    }

    pub fn permission(mut self, granted: bool) -> Self {
        self.permission_granted = granted;
        self
    }
}

impl Default for FixtureSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureNode {
    pub fn new(role: &str) -> Self {
        Self::default().attr(attribute::ROLE, role)
    }

    pub fn attr(mut self, key: &str, value: impl Into<ScalarValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn title(self, title: &str) -> Self {
        self.attr(attribute::TITLE, title)
    }

    pub fn settable(mut self, key: &str) -> Self {
        self.settable.push(key.to_string());
        self
    }

    pub fn sticky(mut self, key: &str) -> Self {
        self.sticky.push(key.to_string());
        self
    }

    pub fn owned_by(mut self, pid: ProcessId) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn exposed_as(mut self, key: &str) -> Self {
        self.exposed_as = Some(key.to_string());
        self
    }

    pub fn child(mut self, node: FixtureNode) -> Self {
        self.children.push(node);
        self
    }
}

// ============================================================================
// FixtureDesktop: arena-backed implementation of the platform traits
// ============================================================================

/// Handle to a node of a `FixtureDesktop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug)]
struct Node {
    attributes: BTreeMap<String, ScalarValue>,
    settable: Vec<String>,
    sticky: Vec<String>,
    pid: ProcessId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

pub struct FixtureDesktop {
    permission_granted: Cell<bool>,
    current_pid: ProcessId,
    processes: Vec<RunningProcess>,
    nodes: RefCell<Vec<Node>>,
    app_roots: HashMap<ProcessId, NodeId>,
    exposures: HashMap<(NodeId, String), NodeId>,
    probe_calls: Cell<usize>,
    prompt_requests: Cell<usize>,
}

impl FixtureDesktop {
    pub fn new(spec: FixtureSpec) -> Self {
        let mut desktop = Self {
            permission_granted: Cell::new(spec.permission_granted),
            current_pid: spec.current_pid,
            processes: Vec::new(),
            nodes: RefCell::new(Vec::new()),
            app_roots: HashMap::new(),
            exposures: HashMap::new(),
            probe_calls: Cell::new(0),
            prompt_requests: Cell::new(0),
        };

        for entry in spec.processes {
            if let Some(tree) = entry.tree {
                let root = desktop.insert(tree, entry.process.pid, None, None);
                desktop.app_roots.insert(entry.process.pid, root);
            }
            desktop.processes.push(entry.process);
        }

        desktop
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SteinError> {
        let spec: FixtureSpec = serde_yaml::from_str(yaml).map_err(|source| SteinError::Yaml {
            context: "fixture desktop".into(),
            source,
        })?;
        Ok(Self::new(spec))
    }

    pub fn load(path: &Path) -> Result<Self, SteinError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| SteinError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    fn insert(
        &mut self,
        spec: FixtureNode,
        owner: ProcessId,
        parent: Option<NodeId>,
        app_root: Option<NodeId>,
    ) -> NodeId {
        let pid = spec.pid.unwrap_or(owner);
        let id = NodeId(self.nodes.get_mut().len());
        self.nodes.get_mut().push(Node {
            attributes: spec.attributes,
            settable: spec.settable,
            sticky: spec.sticky,
            pid,
            parent,
            children: Vec::new(),
        });

        let root = app_root.unwrap_or(id);
        if let Some(key) = spec.exposed_as {
            self.exposures.insert((root, key), id);
        }

        for child in spec.children {
            let child_id = self.insert(child, pid, Some(id), Some(root));
            self.nodes.get_mut()[id.0].children.push(child_id);
        }

        id
    }

    fn tick(&self) {
        self.probe_calls.set(self.probe_calls.get() + 1);
    }

    // ---- Inspection helpers (tests and CLI) ----

    /// Number of accessibility calls made so far.
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.get()
    }

    pub fn prompt_requests(&self) -> usize {
        self.prompt_requests.get()
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission_granted.set(granted);
    }

    /// First node whose `AXTitle` equals `title`, without counting as a probe call.
    pub fn node_titled(&self, title: &str) -> Option<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .position(|n| n.attributes.get(attribute::TITLE) == Some(&ScalarValue::Text(title.to_string())))
            .map(NodeId)
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0).and_then(|n| n.parent)
    }

    /// Raw attribute value, without counting as a probe call.
    pub fn peek(&self, node: NodeId, key: &str) -> Option<ScalarValue> {
        self.nodes.borrow().get(node.0).and_then(|n| n.attributes.get(key).cloned())
    }

    /// Change an attribute behind the engine's back, as another process would.
    pub fn poke(&self, node: NodeId, key: &str, value: ScalarValue) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(node.0) {
            n.attributes.insert(key.to_string(), value);
        }
    }
}

impl AttributeProbe for FixtureDesktop {
    type Element = NodeId;

    fn application(&self, pid: ProcessId) -> Option<NodeId> {
        self.tick();
        self.app_roots.get(&pid).copied()
    }

    fn copy_attribute(&self, element: &NodeId, key: &str) -> Option<AttrValue<NodeId>> {
        self.tick();
        let nodes = self.nodes.borrow();
        let node = nodes.get(element.0)?;

        match key {
            attribute::CHILDREN => Some(AttrValue::Elements(node.children.clone())),
            attribute::PARENT => node.parent.map(AttrValue::Element),
            _ => {
                if let Some(target) = self.exposures.get(&(*element, key.to_string())) {
                    return Some(AttrValue::Element(*target));
                }
                node.attributes.get(key).map(AttrValue::from)
            }
        }
    }

    fn is_settable(&self, element: &NodeId, key: &str) -> bool {
        self.tick();
        self.nodes
            .borrow()
            .get(element.0)
            .is_some_and(|n| n.settable.iter().any(|k| k == key))
    }

    fn write_bool(&self, element: &NodeId, key: &str, value: bool) -> bool {
        self.tick();
        let mut nodes = self.nodes.borrow_mut();
        let Some(node) = nodes.get_mut(element.0) else {
            return false;
        };

        if !node.settable.iter().any(|k| k == key) {
            return false;
        }
        if !node.sticky.iter().any(|k| k == key) {
            node.attributes.insert(key.to_string(), ScalarValue::Bool(value));
        }
        true
    }

    fn owning_process(&self, element: &NodeId) -> ProcessId {
        self.tick();
        self.nodes.borrow().get(element.0).map(|n| n.pid).unwrap_or(0)
    }
}

impl ProcessRegistry for FixtureDesktop {
    fn running_processes(&self) -> Vec<RunningProcess> {
        self.processes.clone()
    }

    fn current_pid(&self) -> ProcessId {
        self.current_pid
    }
}

impl PermissionOracle for FixtureDesktop {
    fn permission_granted(&self) -> bool {
        self.permission_granted.get()
    }

    fn request_permission_prompt(&self) {
        self.prompt_requests.set(self.prompt_requests.get() + 1);
    }
}
