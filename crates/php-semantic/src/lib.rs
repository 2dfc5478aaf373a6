//! Semantic layer over the PHP syntax tree.
//!
//! [`resolve`] builds a [`SymbolTable`] that binds every variable, function,
//! class, constant and member reference to its declaration following PHP's
//! scoping rules. [`build_all`] builds one [`ControlFlowGraph`] per
//! function-like body. Both results refer back to the tree by [`php_ast::Span`]
//! and are independent of each other.

pub mod cfg;
pub mod resolver;
pub mod symbols;

pub use cfg::{
    build_all, build_cfg, BasicBlock, BlockId, BlockKind, ControlFlowGraph, Edge, EdgeKind,
    FunctionCfg, FunctionKind,
};
pub use resolver::{is_superglobal, resolve};
pub use symbols::{
    ClassChain, ClassInfo, NameSpace, Resolution, Scope, ScopeId, ScopeKind, Symbol, SymbolId,
    SymbolKey, SymbolKind, SymbolTable, Usage, UsageKind, VariableFlags,
};
