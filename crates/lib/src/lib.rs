//! antimony-lib: Build-graph generation for antimony workspaces
//!
//! This crate provides the pieces `sb` is built from:
//! - `parser`: lexer and parser for `BUILD.gn` description files
//! - `eval`: the scope-based evaluator that turns files into `Target`s
//! - `label` / `target`: how targets are named and what they contain
//! - `resolver`: memoizing, concurrent dependency closure over labels
//! - `toolchain`: turning module targets into compiler actions
//! - `ninja`: the build-file writer
//! - `generate`: the end-to-end pipeline

pub mod eval;
pub mod generate;
pub mod label;
pub mod ninja;
pub mod parser;
pub mod platform;
pub mod resolver;
pub mod target;
pub mod toolchain;

pub use generate::{GenerateError, GenerateOptions, GenerateSummary, generate};
pub use label::{Label, LabelError};
pub use resolver::{BuildGraph, ResolveError, Resolver, ResolverConfig};
pub use target::{Target, TargetKind};
