//! Label-addressed, memoizing dependency resolution.
//!
//! The resolver loads a directory's description file the first time any label
//! in that directory is requested, caches every target it declared, and serves
//! later lookups from the cache. [`Resolver::closure`] walks the dependency
//! relation breadth-first, resolving each frontier concurrently.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, trace};

use crate::eval::{EvaluateError, ExecutionError, Scope, evaluate_file};
use crate::label::{Label, LabelError};
use crate::parser::{DiagnosticSet, SourceFile};
use crate::target::Target;

/// File name of the per-directory description file.
pub const BUILD_FILE: &str = "BUILD.gn";

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {}:\n{diagnostics}", path.display())]
  Parse { path: PathBuf, diagnostics: DiagnosticSet },

  #[error(transparent)]
  Execution(#[from] ExecutionError),

  #[error("invalid label: {0}")]
  Label(#[from] LabelError),

  #[error("target not found: {0}")]
  NotFound(Label),

  #[error("{dependent} depends on {dependency}, which is not declared")]
  MissingDependency { dependent: Label, dependency: Label },

  #[error("dependency cycle detected: {}", CycleDisplay(cycle))]
  Cycle { cycle: Vec<Label> },

  #[error("resolver task failed: {0}")]
  Task(#[from] JoinError),
}

struct CycleDisplay<'a>(&'a [Label]);

impl fmt::Display for CycleDisplay<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (index, label) in self.0.iter().enumerate() {
      if index > 0 {
        f.write_str(" -> ")?;
      }
      write!(f, "{}", label)?;
    }
    Ok(())
  }
}

/// Resolver settings.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
  /// Workspace root; `//` references are resolved against it.
  pub root: PathBuf,
  /// Description file name looked up in each directory.
  pub build_file: String,
  /// Fail closure computation when the dependency graph has a cycle.
  pub reject_cycles: bool,
}

impl ResolverConfig {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      ..Default::default()
    }
  }
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self {
      root: PathBuf::from("."),
      build_file: BUILD_FILE.to_string(),
      reject_cycles: true,
    }
  }
}

type DirectoryTargets = Arc<Vec<Arc<Target>>>;

struct ResolverState {
  config: ResolverConfig,
  /// One cell per directory; concurrent first requests wait on the same cell.
  directories: Mutex<HashMap<PathBuf, Arc<OnceCell<DirectoryTargets>>>>,
  targets: Mutex<HashMap<Label, Arc<Target>>>,
  loads: AtomicUsize,
}

/// Cheaply cloneable handle to a shared resolver.
#[derive(Clone)]
pub struct Resolver {
  state: Arc<ResolverState>,
}

impl Resolver {
  pub fn new(config: ResolverConfig) -> Self {
    Self {
      state: Arc::new(ResolverState {
        config,
        directories: Mutex::new(HashMap::new()),
        targets: Mutex::new(HashMap::new()),
        loads: AtomicUsize::new(0),
      }),
    }
  }

  pub fn config(&self) -> &ResolverConfig {
    &self.state.config
  }

  pub fn root(&self) -> &Path {
    &self.state.config.root
  }

  /// Number of description files evaluated so far.
  pub fn load_count(&self) -> usize {
    self.state.loads.load(Ordering::SeqCst)
  }

  /// Resolve a textual reference against the workspace root.
  pub fn label(&self, reference: &str) -> Result<Label, ResolveError> {
    Ok(Label::resolve(reference, self.root())?)
  }

  /// Look up the target named by `label`.
  ///
  /// Returns `Ok(None)` when the directory loads but declares no such target.
  pub async fn resolve(&self, label: &Label) -> Result<Option<Arc<Target>>, ResolveError> {
    if let Some(target) = self.state.targets.lock().await.get(label) {
      trace!(label = %label, "target cache hit");
      return Ok(Some(target.clone()));
    }

    let targets = self.load_directory(&label.directory).await?;
    let Some(found) = targets.iter().find(|target| target.label == *label).cloned() else {
      debug!(label = %label, "target not declared");
      return Ok(None);
    };

    let mut cache = self.state.targets.lock().await;
    Ok(Some(cache.entry(label.clone()).or_insert(found).clone()))
  }

  /// All targets declared in `directory`, loading it on first use.
  pub async fn load_directory(&self, directory: &Path) -> Result<DirectoryTargets, ResolveError> {
    let cell = {
      let mut directories = self.state.directories.lock().await;
      directories.entry(directory.to_path_buf()).or_default().clone()
    };

    let targets = cell
      .get_or_try_init(|| self.evaluate_directory(directory.to_path_buf()))
      .await?;
    Ok(targets.clone())
  }

  async fn evaluate_directory(&self, directory: PathBuf) -> Result<DirectoryTargets, ResolveError> {
    let path = directory.join(&self.state.config.build_file);
    let root = self.state.config.root.clone();
    self.state.loads.fetch_add(1, Ordering::SeqCst);
    debug!(path = %path.display(), "loading description file");

    let text = tokio::fs::read_to_string(&path).await.map_err(|source| ResolveError::Io {
      path: path.clone(),
      source,
    })?;

    let targets = tokio::task::spawn_blocking(move || {
      let source = SourceFile::from_buffer(text, path.clone());
      let mut scope = Scope::new(directory, root);
      evaluate_file(&source, &mut scope).map_err(|err| match err {
        EvaluateError::Parse(diagnostics) => ResolveError::Parse { path, diagnostics },
        EvaluateError::Execution(err) => ResolveError::Execution(err),
      })
    })
    .await??;

    debug!(count = targets.len(), "evaluated description file");
    Ok(Arc::new(targets.into_iter().map(Arc::new).collect()))
  }

  /// Compute the transitive dependency closure of `root`.
  pub async fn closure(&self, root: &Label) -> Result<BuildGraph, ResolveError> {
    let root_target = self
      .resolve(root)
      .await?
      .ok_or_else(|| ResolveError::NotFound(root.clone()))?;

    let mut targets = BTreeMap::new();
    let mut frontier: Vec<(Label, Label)> = root_target
      .dependency_labels()
      .into_iter()
      .map(|dependency| (root.clone(), dependency))
      .collect();
    targets.insert(root.clone(), root_target);
    let mut expansions = 0;

    while !frontier.is_empty() {
      expansions += 1;
      debug!(expansion = expansions, frontier = frontier.len(), "expanding frontier");

      let mut scheduled = HashSet::new();
      let mut join_set = JoinSet::new();
      for (dependent, dependency) in frontier.drain(..) {
        if targets.contains_key(&dependency) || !scheduled.insert(dependency.clone()) {
          continue;
        }
        let resolver = self.clone();
        join_set.spawn(async move {
          let result = resolver.resolve(&dependency).await;
          (dependent, dependency, result)
        });
      }

      while let Some(joined) = join_set.join_next().await {
        let (dependent, dependency, result) = joined?;
        let target = result?.ok_or_else(|| ResolveError::MissingDependency {
          dependent,
          dependency: dependency.clone(),
        })?;
        frontier.extend(
          target
            .dependency_labels()
            .into_iter()
            .map(|next| (dependency.clone(), next)),
        );
        targets.insert(dependency, target);
      }
    }

    let graph = BuildGraph {
      root: root.clone(),
      targets,
      expansions,
    };
    if self.state.config.reject_cycles {
      graph.check_acyclic()?;
    }

    info!(
      root = %root,
      targets = graph.len(),
      expansions,
      loads = self.load_count(),
      "resolved dependency closure"
    );
    Ok(graph)
  }
}

/// The transitive closure of one root target.
#[derive(Debug, Clone)]
pub struct BuildGraph {
  pub root: Label,
  pub targets: BTreeMap<Label, Arc<Target>>,
  /// Number of frontier expansions the closure took.
  pub expansions: usize,
}

impl BuildGraph {
  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  pub fn get(&self, label: &Label) -> Option<&Arc<Target>> {
    self.targets.get(label)
  }

  pub fn contains(&self, label: &Label) -> bool {
    self.targets.contains_key(label)
  }

  pub fn root_target(&self) -> Option<&Arc<Target>> {
    self.targets.get(&self.root)
  }

  /// Targets in label order.
  pub fn iter(&self) -> impl Iterator<Item = &Arc<Target>> {
    self.targets.values()
  }

  fn graph(&self) -> (DiGraph<&Label, ()>, HashMap<&Label, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();
    for label in self.targets.keys() {
      nodes.insert(label, graph.add_node(label));
    }
    for (label, target) in &self.targets {
      for dependency in target.dependency_labels() {
        if let Some(&from) = nodes.get(&dependency) {
          graph.add_edge(from, nodes[label], ());
        }
      }
    }
    (graph, nodes)
  }

  /// Fail with [`ResolveError::Cycle`] if any dependency cycle exists.
  pub fn check_acyclic(&self) -> Result<(), ResolveError> {
    let (graph, _) = self.graph();
    for component in tarjan_scc(&graph) {
      let self_loop = component.len() == 1 && graph.contains_edge(component[0], component[0]);
      if component.len() > 1 || self_loop {
        let mut cycle: Vec<Label> = component.iter().map(|&index| graph[index].clone()).collect();
        cycle.sort();
        return Err(ResolveError::Cycle { cycle });
      }
    }
    Ok(())
  }

  /// Dependencies before dependents; falls back to label order when the graph
  /// has a cycle.
  pub fn ordered(&self) -> Vec<&Arc<Target>> {
    let (graph, _) = self.graph();
    match toposort(&graph, None) {
      Ok(order) => order.into_iter().map(|index| &self.targets[graph[index]]).collect(),
      Err(_) => self.targets.values().collect(),
    }
  }
}
