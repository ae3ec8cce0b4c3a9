//! Compiled Appfile dependency graph.
//!
//! The graph builder is an external collaborator: it hands the core a
//! [`Compiled`], a rooted DAG whose vertices each carry one [`Appfile`].
//! The walk implemented here is the only scheduling the core relies on:
//! vertices run after all their dependencies completed, independent
//! branches fan out in parallel, and a failed vertex blocks its dependents
//! while disjoint branches keep draining. The first callback error is
//! reported once the walk has drained.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;

use crate::appfile::Appfile;

/// Graph errors
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("dependency graph has no root vertex '{0}'")]
    RootNotFound(String),
    #[error("dependency '{0}' is not a vertex of the graph")]
    UnknownVertex(String),
    #[error("vertex '{0}' is already present")]
    DuplicateVertex(String),
    #[error("dependency graph contains a cycle")]
    Cycle,
}

/// Error returned by [`Compiled::walk`]: either the graph itself is
/// unusable or a vertex callback failed.
#[derive(Debug, Error)]
pub enum WalkError<E> {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("{0}")]
    Callback(E),
}

/// State of a vertex during one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexState {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
struct Vertex {
    file: Arc<Appfile>,
    depends_on: Vec<String>,
}

/// What the walk hands to its callback for one vertex.
#[derive(Debug, Clone)]
pub struct WalkStep {
    /// The appfile compiled into this vertex.
    pub file: Arc<Appfile>,
    /// Whether this vertex is the graph root.
    pub is_root: bool,
}

/// A compiled Appfile: the dependency graph plus the id of its root vertex.
///
/// The root transitively depends on every other vertex, so during a walk it
/// is necessarily the last callback to run.
#[derive(Debug, Clone)]
pub struct Compiled {
    root: String,
    vertices: HashMap<String, Vertex>,
}

impl Compiled {
    /// Create an empty graph rooted at the vertex with id `root_id`.
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root: root_id.into(),
            vertices: HashMap::new(),
        }
    }

    /// Add a vertex; the appfile id is the vertex key.
    pub fn add_vertex(&mut self, file: Appfile) -> Result<(), GraphError> {
        if self.vertices.contains_key(&file.id) {
            return Err(GraphError::DuplicateVertex(file.id.clone()));
        }
        self.vertices.insert(
            file.id.clone(),
            Vertex {
                file: Arc::new(file),
                depends_on: Vec::new(),
            },
        );
        Ok(())
    }

    /// Declare that `dependent` depends on `dependency`. Both vertices must
    /// already be present.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<(), GraphError> {
        if !self.vertices.contains_key(dependency) {
            return Err(GraphError::UnknownVertex(dependency.to_string()));
        }
        let vertex = self
            .vertices
            .get_mut(dependent)
            .ok_or_else(|| GraphError::UnknownVertex(dependent.to_string()))?;
        if !vertex.depends_on.iter().any(|dep| dep == dependency) {
            vertex.depends_on.push(dependency.to_string());
        }
        Ok(())
    }

    /// The root appfile.
    pub fn root(&self) -> Result<&Arc<Appfile>, GraphError> {
        self.vertices
            .get(&self.root)
            .map(|vertex| &vertex.file)
            .ok_or_else(|| GraphError::RootNotFound(self.root.clone()))
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate over every appfile in the graph, in no particular order.
    pub fn files(&self) -> impl Iterator<Item = &Arc<Appfile>> {
        self.vertices.values().map(|vertex| &vertex.file)
    }

    /// Walk the graph in dependency order, fanning out up to `max_parallel`
    /// ready vertices at a time. A vertex whose callback fails blocks its
    /// dependents; disjoint branches keep running. The first callback error
    /// is returned after the walk drains.
    pub async fn walk<F, Fut, E>(&self, max_parallel: usize, f: F) -> Result<(), WalkError<E>>
    where
        F: Fn(WalkStep) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.root()?;
        let max_parallel = max_parallel.max(1);

        let mut state: HashMap<&str, VertexState> = self
            .vertices
            .keys()
            .map(|id| (id.as_str(), VertexState::Pending))
            .collect();
        let mut first_err: Option<E> = None;

        loop {
            let ready: Vec<&str> = self
                .vertices
                .iter()
                .filter(|(id, vertex)| {
                    state.get(id.as_str()) == Some(&VertexState::Pending)
                        && vertex
                            .depends_on
                            .iter()
                            .all(|dep| state.get(dep.as_str()) == Some(&VertexState::Completed))
                })
                .map(|(id, _)| id.as_str())
                .collect();

            if ready.is_empty() {
                if state.values().all(|s| *s == VertexState::Completed) {
                    return Ok(());
                }
                if let Some(err) = first_err {
                    return Err(WalkError::Callback(err));
                }
                return Err(GraphError::Cycle.into());
            }

            let mut in_flight = FuturesUnordered::new();
            for id in ready.into_iter().take(max_parallel) {
                if let Some(s) = state.get_mut(id) {
                    *s = VertexState::Running;
                }
                let vertex = &self.vertices[id];
                let step = WalkStep {
                    file: Arc::clone(&vertex.file),
                    is_root: id == self.root,
                };
                let fut = f(step);
                in_flight.push(async move { (id, fut.await) });
            }

            while let Some((id, result)) = in_flight.next().await {
                let next = match result {
                    Ok(()) => VertexState::Completed,
                    Err(err) => {
                        first_err.get_or_insert(err);
                        VertexState::Failed
                    }
                };
                if let Some(s) = state.get_mut(id) {
                    *s = next;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    use crate::appfile::{Application, Project};

    fn appfile(id: &str) -> Appfile {
        Appfile {
            id: id.to_string(),
            application: Application {
                name: format!("{id} app"),
                kind: "ruby".to_string(),
            },
            project: Project {
                name: format!("{id} project"),
                infrastructure: "aws".to_string(),
            },
            infrastructure: Vec::new(),
        }
    }

    fn two_dep_graph() -> Compiled {
        let mut compiled = Compiled::new("root");
        compiled.add_vertex(appfile("root")).expect("root");
        compiled.add_vertex(appfile("d1")).expect("d1");
        compiled.add_vertex(appfile("d2")).expect("d2");
        compiled.add_dependency("root", "d1").expect("edge");
        compiled.add_dependency("root", "d2").expect("edge");
        compiled
    }

    #[test]
    fn test_single_vertex_walk_visits_root_once() {
        tokio_test::block_on(async {
            let mut compiled = Compiled::new("root");
            compiled.add_vertex(appfile("root")).expect("root");

            let visits = Mutex::new(Vec::new());
            compiled
                .walk(4, |step| {
                    let visits = &visits;
                    async move {
                        visits.lock().unwrap().push((step.file.id.clone(), step.is_root));
                        Ok::<_, io::Error>(())
                    }
                })
                .await
                .expect("walk");

            assert_eq!(visits.lock().unwrap().as_slice(), &[("root".to_string(), true)]);
        });
    }

    #[test]
    fn test_walk_runs_dependencies_before_root() {
        tokio_test::block_on(async {
            let compiled = two_dep_graph();

            let order = Mutex::new(Vec::new());
            compiled
                .walk(4, |step| {
                    let order = &order;
                    async move {
                        order.lock().unwrap().push(step.file.id.clone());
                        Ok::<_, io::Error>(())
                    }
                })
                .await
                .expect("walk");

            let order = order.lock().unwrap();
            assert_eq!(order.len(), 3);
            assert_eq!(order.last().map(String::as_str), Some("root"));
        });
    }

    #[test]
    fn test_walk_fans_out_independent_vertices() {
        tokio_test::block_on(async {
            let compiled = two_dep_graph();

            let active = AtomicUsize::new(0);
            let peak = AtomicUsize::new(0);
            compiled
                .walk(4, |step| {
                    let active = &active;
                    let peak = &peak;
                    async move {
                        if !step.is_root {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            sleep(Duration::from_millis(20)).await;
                            active.fetch_sub(1, Ordering::SeqCst);
                        }
                        Ok::<_, io::Error>(())
                    }
                })
                .await
                .expect("walk");

            assert!(peak.load(Ordering::SeqCst) >= 2);
        });
    }

    #[test]
    fn test_failed_vertex_blocks_dependents_and_reports_first_error() {
        tokio_test::block_on(async {
            let mut compiled = two_dep_graph();
            compiled.add_vertex(appfile("d1-child")).expect("vertex");
            compiled.add_dependency("d1", "d1-child").expect("edge");

            let visited = Mutex::new(Vec::new());
            let err = compiled
                .walk(4, |step| {
                    let visited = &visited;
                    async move {
                        visited.lock().unwrap().push(step.file.id.clone());
                        if step.file.id == "d1-child" {
                            return Err(io::Error::other("boom"));
                        }
                        Ok(())
                    }
                })
                .await
                .expect_err("walk should fail");

            match err {
                WalkError::Callback(err) => assert_eq!(err.to_string(), "boom"),
                other => panic!("expected callback error, got {other:?}"),
            }

            let visited = visited.lock().unwrap();
            // d1 and the root never ran; the disjoint d2 branch drained.
            assert!(!visited.contains(&"d1".to_string()));
            assert!(!visited.contains(&"root".to_string()));
            assert!(visited.contains(&"d2".to_string()));
        });
    }

    #[test]
    fn test_walk_detects_cycle() {
        tokio_test::block_on(async {
            let mut compiled = Compiled::new("root");
            compiled.add_vertex(appfile("root")).expect("root");
            compiled.add_vertex(appfile("a")).expect("a");
            compiled.add_vertex(appfile("b")).expect("b");
            compiled.add_dependency("root", "a").expect("edge");
            compiled.add_dependency("a", "b").expect("edge");
            compiled.add_dependency("b", "a").expect("edge");

            let err = compiled
                .walk(4, |_step| async move { Ok::<_, io::Error>(()) })
                .await
                .expect_err("walk should fail");
            assert!(matches!(err, WalkError::Graph(GraphError::Cycle)));
        });
    }

    #[test]
    fn test_walk_without_root_vertex_fails() {
        tokio_test::block_on(async {
            let mut compiled = Compiled::new("missing");
            compiled.add_vertex(appfile("other")).expect("vertex");

            assert!(matches!(compiled.root(), Err(GraphError::RootNotFound(_))));

            let err = compiled
                .walk(4, |_step| async move { Ok::<_, io::Error>(()) })
                .await
                .expect_err("walk should fail");
            assert!(matches!(err, WalkError::Graph(GraphError::RootNotFound(_))));
        });
    }

    #[test]
    fn test_add_dependency_rejects_unknown_vertices() {
        let mut compiled = Compiled::new("root");
        compiled.add_vertex(appfile("root")).expect("root");

        assert!(matches!(
            compiled.add_dependency("root", "ghost"),
            Err(GraphError::UnknownVertex(_))
        ));
        assert!(matches!(
            compiled.add_dependency("ghost", "root"),
            Err(GraphError::UnknownVertex(_))
        ));
    }

    #[test]
    fn test_add_vertex_rejects_duplicates() {
        let mut compiled = Compiled::new("root");
        compiled.add_vertex(appfile("root")).expect("root");
        assert!(matches!(
            compiled.add_vertex(appfile("root")),
            Err(GraphError::DuplicateVertex(_))
        ));
    }
}
