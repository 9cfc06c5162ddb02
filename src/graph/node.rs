use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use once_cell::sync::OnceCell;

use super::{AdapterRegistry, ConfigError, CycleError};
use crate::backend::Adapter;
use crate::join::JoinContext;
use crate::post_op::PostOp;
use crate::table::Table;
use crate::template::{Arg, Template, TemplateError};

/// Where a node sits in the fetch/fold lifecycle (§4.6 state machine).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    Pending,
    Fetching,
    Fetched,
    FoldedIntoParent,
    Failed,
}

struct NodeState {
    parent: Option<Weak<Node>>,
    children: Vec<Arc<Node>>,
    /// This node's own join context, i.e. how *it* folds into its parent.
    /// `None` for the root, `Some` for every attached non-root node (§3).
    join_context: Option<JoinContext>,
    post_ops: Vec<Arc<dyn PostOp>>,
    result_table: Option<Table>,
    status: NodeStatus,
    executed: bool,
}

/// One query in the graph (§3). Nodes are always held behind an `Arc`
/// since the fetch phase shares them across worker threads and children
/// keep a weak back-reference to their parent.
pub struct Node {
    name: String,
    template_raw: String,
    template_parsed: OnceCell<Result<Template, TemplateError>>,
    adapter: Arc<dyn Adapter>,
    fields: Option<Vec<String>>,
    state: RwLock<NodeState>,
}

impl Node {
    /// Builds a standalone node (no parent, no children yet) against an
    /// adapter looked up by name in `registry`. Fails with
    /// [`ConfigError`] if the name isn't registered (§9).
    pub fn new_node(
        registry: &AdapterRegistry,
        name: impl Into<String>,
        template: impl Into<String>,
        adapter_name: &str,
        fields: Option<Vec<String>>,
    ) -> Result<Arc<Node>, ConfigError> {
        let adapter = registry.get(adapter_name)?;
        Ok(Arc::new(Node {
            name: name.into(),
            template_raw: template.into(),
            template_parsed: OnceCell::new(),
            adapter,
            fields,
            state: RwLock::new(NodeState {
                parent: None,
                children: Vec::new(),
                join_context: None,
                post_ops: Vec::new(),
                result_table: None,
                status: NodeStatus::Pending,
                executed: false,
            }),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    pub fn is_root(&self) -> bool {
        self.state.read().unwrap().parent.is_none()
    }

    pub fn parent(&self) -> Option<Arc<Node>> {
        self.state.read().unwrap().parent.clone()?.upgrade()
    }

    pub fn children(&self) -> Vec<Arc<Node>> {
        self.state.read().unwrap().children.clone()
    }

    pub fn join_context(&self) -> Option<JoinContext> {
        self.state.read().unwrap().join_context.clone()
    }

    pub fn post_ops(&self) -> Vec<Arc<dyn PostOp>> {
        self.state.read().unwrap().post_ops.clone()
    }

    /// Installs this node's post-processing sequence (§4.8). Callers set
    /// this once, before the first `execute()`.
    pub fn set_post_ops(&self, ops: Vec<Arc<dyn PostOp>>) {
        self.state.write().unwrap().post_ops = ops;
    }

    pub fn status(&self) -> NodeStatus {
        self.state.read().unwrap().status
    }

    pub fn set_status(&self, status: NodeStatus) {
        self.state.write().unwrap().status = status;
    }

    pub fn executed(&self) -> bool {
        self.state.read().unwrap().executed
    }

    pub fn result_table(&self) -> Option<Table> {
        self.state.read().unwrap().result_table.clone()
    }

    /// Publishes this node's fetched table, flipping `executed` and the
    /// state machine to `Fetched`. Called exactly once per fetch, by the
    /// node's own worker (§5 "shared resources").
    pub fn set_result_table(&self, table: Table) {
        let mut state = self.state.write().unwrap();
        state.result_table = Some(table);
        state.status = NodeStatus::Fetched;
        state.executed = true;
    }

    /// The parent's currently-stored table, or `None` for the root / before
    /// the parent has fetched.
    pub fn parent_table(&self) -> Option<Table> {
        self.parent()?.result_table()
    }

    /// This node's template, parsed once and cached (§4.3 "parse once").
    pub fn template(&self) -> Result<Template, TemplateError> {
        self.template_parsed
            .get_or_init(|| Template::parse(&self.template_raw))
            .clone()
    }

    /// Renders this node's template against its parent's current table (if
    /// any) and the caller's independent parameters.
    pub fn render(&self, params: &HashMap<String, Arg>) -> Result<String, TemplateError> {
        let template = self.template()?;
        let parent_table = self.parent_table();
        template.render(parent_table.as_ref(), params, self.adapter.value_converter())
    }

    /// Resets this single node's lifecycle state - used by `reset_tree` at
    /// the start of every `execute()` call so a tree can be re-run (§3
    /// Lifecycle, OQ-1).
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap();
        state.result_table = None;
        state.status = NodeStatus::Pending;
        state.executed = false;
    }

    /// Resets every node in `root`'s subtree, `root` included.
    pub fn reset_tree(root: &Arc<Node>) {
        for node in Node::preorder(root) {
            node.reset();
        }
    }

    /// `root`, then every descendant, parent before any of its children
    /// (§4.5). Reversing this sequence is a valid fold order.
    pub fn preorder(root: &Arc<Node>) -> Vec<Arc<Node>> {
        let mut out = vec![Arc::clone(root)];
        let children = root.children();
        for child in &children {
            out.extend(Node::preorder(child));
        }
        out
    }

    /// True iff `parent` is already reachable by walking down from
    /// `candidate_child` - i.e. attaching `candidate_child` under `parent`
    /// would close a cycle (§4.5).
    pub fn creates_cycle(parent: &Arc<Node>, candidate_child: &Arc<Node>) -> bool {
        Node::preorder(candidate_child)
            .iter()
            .any(|n| Arc::ptr_eq(n, parent))
    }

    /// Attaches `child` under `parent` with the given join context.
    /// Rejects a cycle or a child that already has a parent (§3, §4.5).
    /// Both sides of the edge are updated atomically with respect to the
    /// rest of the tree's shape (the two writes below happen under the
    /// cycle check, which already ensures the edge is legal to add).
    pub fn add_child(
        parent: &Arc<Node>,
        child: Arc<Node>,
        join_context: JoinContext,
    ) -> Result<(), CycleError> {
        if let Some(existing) = child.parent() {
            return Err(CycleError::AlreadyHasParent {
                child: child.name.clone(),
                existing_parent: existing.name.clone(),
            });
        }

        if Node::creates_cycle(parent, &child) {
            return Err(CycleError::WouldCycle {
                parent: parent.name.clone(),
                child: child.name.clone(),
            });
        }

        {
            let mut child_state = child.state.write().unwrap();
            child_state.parent = Some(Arc::downgrade(parent));
            child_state.join_context = Some(join_context);
        }
        {
            let mut parent_state = parent.state.write().unwrap();
            parent_state.children.push(child);
        }

        Ok(())
    }

    /// Detaches `child` from its parent (if any), returning its join
    /// context. Both sides of the edge are cleared together.
    pub fn detach(child: &Arc<Node>) -> Option<JoinContext> {
        if let Some(parent) = child.parent() {
            let mut parent_state = parent.state.write().unwrap();
            parent_state.children.retain(|c| !Arc::ptr_eq(c, child));
        }

        let mut child_state = child.state.write().unwrap();
        child_state.parent = None;
        child_state.join_context.take()
    }
}
