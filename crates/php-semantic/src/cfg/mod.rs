//! Intra-procedural control-flow graphs.
//!
//! One graph per function-like body. Blocks live in an arena addressed by
//! [`BlockId`]; statements are referenced by span so the graph never borrows
//! the tree. Every graph has a distinguished entry block, one `exit` block
//! for normal and exceptional termination, and one `unknown_exit` block that
//! collects edges the builder cannot model (unknown `goto` labels, computed
//! `break` levels). Blocks unreachable from the entry are flagged `dead`.

mod builder;

pub use builder::{build_all, build_cfg, FunctionCfg, FunctionKind};

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use php_ast::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Entry,
    Exit,
    Unknown,
    Normal,
    /// Evaluates an `if`/`elseif`/`switch`/`match` subject.
    Condition,
    LoopHeader,
    Case,
    Catch,
    Finally,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    Unconditional,
    True,
    False,
    Case,
    Default,
    Exception,
    Break,
    Continue,
    Jump,
    Return,
    /// Switch case without a terminating `break` running into the next one.
    Fallthrough,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Unconditional => "",
            EdgeKind::True => "true",
            EdgeKind::False => "false",
            EdgeKind::Case => "case",
            EdgeKind::Default => "default",
            EdgeKind::Exception => "exception",
            EdgeKind::Break => "break",
            EdgeKind::Continue => "continue",
            EdgeKind::Jump => "jump",
            EdgeKind::Return => "return",
            EdgeKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub target: BlockId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Spans of the statements (or match arms and catch clauses) executed
    /// in this block, in order.
    pub statements: Vec<Span>,
    pub successors: Vec<Edge>,
    pub predecessors: Vec<BlockId>,
    /// Not reachable from the entry block.
    pub dead: bool,
}

impl BasicBlock {
    fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            statements: Vec::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            dead: false,
        }
    }

    pub fn has_edge_to(&self, target: BlockId, kind: EdgeKind) -> bool {
        self.successors.contains(&Edge { target, kind })
    }
}

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    blocks: Vec<BasicBlock>,
    entry: BlockId,
    exit: BlockId,
    unknown_exit: BlockId,
    stmt_blocks: HashMap<Span, BlockId>,
}

impl ControlFlowGraph {
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn exit(&self) -> BlockId {
        self.exit
    }

    pub fn unknown_exit(&self) -> BlockId {
        self.unknown_exit
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    /// Block that executes the statement at `stmt`. Compound statements map
    /// to the block evaluating their condition.
    pub fn block_of(&self, stmt: Span) -> Option<BlockId> {
        self.stmt_blocks.get(&stmt).copied()
    }

    pub fn successors(&self, id: BlockId) -> &[Edge] {
        &self.blocks[id.0].successors
    }

    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        &self.blocks[id.0].predecessors
    }

    pub fn reachable_from_entry(&self) -> HashSet<BlockId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.entry]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            queue.extend(self.blocks[id.0].successors.iter().map(|e| e.target));
        }
        seen
    }

    pub fn dead_blocks(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.blocks.iter().filter(|b| b.dead)
    }

    /// Live blocks that leave the function: they return, throw out of it,
    /// fall off the end of the body, or jump somewhere unknown.
    pub fn exit_blocks(&self) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|b| {
                !b.dead
                    && b.successors
                        .iter()
                        .any(|e| e.target == self.exit || e.target == self.unknown_exit)
            })
            .map(|b| b.id)
            .collect()
    }

    fn mark_dead(&mut self) {
        let reachable = self.reachable_from_entry();
        for block in &mut self.blocks {
            block.dead = !reachable.contains(&block.id);
        }
    }
}

impl fmt::Display for ControlFlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{} {:?}", block.id, block.kind)?;
            if !block.statements.is_empty() {
                write!(f, " [{}]", block.statements.len())?;
            }
            if block.dead {
                write!(f, " dead")?;
            }
            for (i, edge) in block.successors.iter().enumerate() {
                f.write_str(if i == 0 { " -> " } else { ", " })?;
                write!(f, "{}", edge.target)?;
                if edge.kind != EdgeKind::Unconditional {
                    write!(f, ":{}", edge.kind.as_str())?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
