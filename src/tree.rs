//! The command tree: every registered command placed at its path, with stub
//! nodes synthesized for ancestors nobody defined, plus resolution of an
//! argv prefix to an invocation chain.

use indexmap::IndexMap;

use crate::{
    classify::{classify, FlagOption},
    error::{SpecError, ValidationError},
    name,
    spec::{CommandSpec, ParamKind},
};

/// Index-linked arena of command nodes. Node `0` is always the root.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

/// One node of the tree. A stub node was never registered directly; it exists
/// only because some descendant was.
#[derive(Debug)]
pub struct CommandNode {
    spec: CommandSpec,
    display: String,
    segment: String,
    stub: bool,
    children: IndexMap<String, usize>,
    flag_options: Vec<FlagOption>,
}

impl CommandNode {
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// The full space-separated path, `__root__` for the root.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The last path segment, by which the parent addresses this node.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn is_stub(&self) -> bool {
        self.stub
    }

    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// The boolean options this node's flag-set parameters expand to.
    pub fn flag_options(&self) -> &[FlagOption] {
        &self.flag_options
    }

    fn expected(&self) -> String {
        self.children.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
    }

    fn has_positionals(&self) -> bool {
        self.spec.params().iter().any(|p| {
            matches!(p.kind(), ParamKind::Required | ParamKind::Defaulted | ParamKind::Variadic)
        })
    }
}

impl CommandTree {
    /// Builds the tree from every registered command. Paths are normalized,
    /// missing ancestors become stubs, and each node's parameters are checked
    /// and classified.
    pub fn build(specs: Vec<CommandSpec>) -> Result<CommandTree, SpecError> {
        let mut nodes = vec![CommandNode {
            spec: CommandSpec::root(),
            display: "__root__".to_string(),
            segment: String::new(),
            stub: true,
            children: IndexMap::new(),
            flag_options: Vec::new(),
        }];

        for spec in specs {
            if spec.is_root() {
                if !nodes[0].stub {
                    return Err(SpecError::MultipleRoots);
                }
                nodes[0].spec = spec;
                nodes[0].stub = false;
                tracing::debug!("registered root command");
                continue;
            }
            let segments = name::normalize_path(&spec.raw_path)?;
            let display_path = segments.join(" ");
            let mut current = 0usize;
            for (i, segment) in segments.iter().enumerate() {
                current = match nodes[current].children.get(segment).copied() {
                    Some(child) => child,
                    None => {
                        let child = nodes.len();
                        nodes.push(CommandNode {
                            spec: CommandSpec::new(""),
                            display: segments[..=i].join(" "),
                            segment: segment.clone(),
                            stub: true,
                            children: IndexMap::new(),
                            flag_options: Vec::new(),
                        });
                        nodes[current].children.insert(segment.clone(), child);
                        child
                    }
                };
            }
            if !nodes[current].stub {
                return Err(SpecError::DuplicateCommand { path: display_path });
            }
            nodes[current].spec = spec;
            nodes[current].stub = false;
            tracing::debug!(path = %display_path, "registered command");
        }

        for node in &mut nodes {
            let params = std::mem::take(&mut node.spec.params);
            let (params, flag_options) = classify(&node.display, params)?;
            node.spec.params = params;
            node.flag_options = flag_options;
        }

        for node in &nodes {
            if !node.children.is_empty() && node.has_positionals() {
                return Err(SpecError::InnerPositionals { path: node.display.clone() });
            }
        }

        Ok(CommandTree { nodes })
    }

    pub fn root(&self) -> &CommandNode {
        &self.nodes[0]
    }

    /// All nodes, root first, in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &CommandNode> {
        self.nodes.iter()
    }

    /// Walks `words` as far as they name children, then checks that the node
    /// reached can actually run. The remaining words (from `consumed()` on)
    /// are the target's arguments.
    pub fn resolve<'t>(&'t self, words: &[&str]) -> Result<InvocationContext<'t>, ValidationError> {
        let mut current = 0usize;
        let mut chain = Vec::new();
        if !self.nodes[0].stub {
            chain.push(0);
        }
        let mut consumed = 0usize;
        let mut next_word: Option<String> = None;
        for word in words {
            let normalized = match name::normalize_word(word) {
                Ok(it) => it,
                Err(_) => word.to_string(),
            };
            match self.nodes[current].children.get(&normalized) {
                Some(&child) => {
                    current = child;
                    chain.push(child);
                    consumed += 1;
                }
                None => {
                    next_word = Some(word.to_string());
                    break;
                }
            }
        }
        if self.nodes[current].stub {
            let expected = self.nodes[current].expected();
            return Err(match next_word {
                Some(word) => ValidationError::UnknownCommand { word, expected },
                None => ValidationError::CommandRequired { expected },
            });
        }
        tracing::trace!(target_path = %self.nodes[current].display, depth = chain.len(), "resolved");
        Ok(InvocationContext { tree: self, chain, pos: 0, consumed })
    }
}

/// One resolved invocation: the chain of nodes from the outermost ancestor to
/// the target, and a cursor the invocation layer advances as each member's
/// body runs.
#[derive(Debug)]
pub struct InvocationContext<'t> {
    tree: &'t CommandTree,
    chain: Vec<usize>,
    pos: usize,
    consumed: usize,
}

impl<'t> InvocationContext<'t> {
    pub fn chain(&self) -> impl Iterator<Item = &'t CommandNode> + '_ {
        self.chain.iter().map(|&i| &self.tree.nodes[i])
    }

    /// The node the invocation addressed; the last chain member.
    pub fn target(&self) -> &'t CommandNode {
        &self.tree.nodes[self.chain[self.chain.len() - 1]]
    }

    /// The chain member whose body is running now.
    pub fn current(&self) -> &'t CommandNode {
        &self.tree.nodes[self.chain[self.pos]]
    }

    /// Whether the currently running member is the target. Ancestors use this
    /// to tell a pass-through invocation from one addressed to them.
    pub fn is_target(&self) -> bool {
        self.pos + 1 == self.chain.len()
    }

    /// Moves the cursor to the next chain member.
    pub fn advance(&mut self) {
        if !self.is_target() {
            self.pos += 1;
        }
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// How many leading words named commands rather than arguments.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}
