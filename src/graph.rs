//! Resource dependency graph
//!
//! Resources are registered leaves-first; each node carries explicit
//! `depends_on` edges plus implicit edges collected from every attribute
//! reference inside its spec. The graph is validated (no duplicates, no
//! cycles) before being rendered for the provisioning engine, which owns
//! all diffing, parallelism, and retries.

pub mod value;

use std::collections::HashMap;

use crate::error::GraphError;
use crate::resources::{ResourceKind, ResourceSpec};
use value::Value;

/// Opaque handle to a registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A declared resource: name, typed spec, and ordering edges.
#[derive(Debug)]
pub struct ResourceNode {
    pub name: String,
    pub spec: ResourceSpec,
    /// Every resource that must be created before this one
    pub depends_on: Vec<ResourceId>,
}

impl ResourceNode {
    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }
}

/// The in-memory dependency graph handed to the provisioning engine.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
    by_name: HashMap<String, ResourceId>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource. Ordering edges are the union of `depends_on`
    /// and the attribute references inside `spec`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        spec: ResourceSpec,
        depends_on: &[ResourceId],
    ) -> Result<ResourceId, GraphError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }

        let mut edges: Vec<ResourceId> = depends_on.to_vec();
        edges.extend(spec.refs());
        edges.sort_unstable_by_key(|id| id.0);
        edges.dedup();

        if let Some(dep) = edges.iter().find(|dep| dep.0 >= self.nodes.len()) {
            return Err(GraphError::UnknownDependency { id: dep.0, name });
        }

        let id = ResourceId(self.nodes.len());
        self.by_name.insert(name.clone(), id);
        self.nodes.push(ResourceNode {
            name,
            spec,
            depends_on: edges,
        });
        Ok(id)
    }

    /// Build a reference to an attribute of a registered resource.
    pub fn ref_attr(&self, id: ResourceId, attr: impl Into<String>) -> Value {
        Value::Ref {
            resource: id,
            target: self.nodes[id.0].name.clone(),
            attr: attr.into(),
        }
    }

    pub fn node(&self, id: ResourceId) -> &ResourceNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, name: &str) -> Option<ResourceId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (ResourceId(i), n))
    }

    /// Topological creation order (Kahn's algorithm, lowest id first for
    /// determinism). Registration order is already a valid order by
    /// construction; this re-derives one and rejects cycles.
    pub fn topo_order(&self) -> Result<Vec<ResourceId>, GraphError> {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, node) in self.nodes.iter().enumerate() {
            indegree[i] = node.depends_on.len();
            for dep in &node.depends_on {
                dependents[dep.0].push(i);
            }
        }

        let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(&next) = ready.iter().min() {
            ready.retain(|&i| i != next);
            order.push(ResourceId(next));
            for &dependent in &dependents[next] {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.push(dependent);
                }
            }
        }

        if order.len() != n {
            let stuck = indegree
                .iter()
                .position(|&d| d > 0)
                .map(|i| self.nodes[i].name.clone())
                .unwrap_or_default();
            return Err(GraphError::DependencyCycle(stuck));
        }
        Ok(order)
    }

    /// Whether `a` transitively depends on `b`, i.e. `b` must be created
    /// before `a` can be.
    pub fn requires(&self, a: ResourceId, b: ResourceId) -> bool {
        let mut stack = vec![a];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(current) = stack.pop() {
            for dep in &self.nodes[current.0].depends_on {
                if *dep == b {
                    return true;
                }
                if !seen[dep.0] {
                    seen[dep.0] = true;
                    stack.push(*dep);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{FileSystemSpec, MountTargetSpec, VpcSpec};

    fn vpc_spec() -> ResourceSpec {
        ResourceSpec::Vpc(VpcSpec {
            enable_dns_hostnames: true,
            enable_dns_support: true,
            tags: None,
        })
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut g = ResourceGraph::new();
        g.add("vpc", vpc_spec(), &[]).unwrap();
        let err = g.add("vpc", vpc_spec(), &[]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateName(name) if name == "vpc"));
    }

    #[test]
    fn test_ref_creates_edge() {
        let mut g = ResourceGraph::new();
        let fs = g
            .add("fs", ResourceSpec::FileSystem(FileSystemSpec { tags: None }), &[])
            .unwrap();
        let fs_id = g.ref_attr(fs, "id");
        let vpc = g.add("vpc", vpc_spec(), &[]).unwrap();
        let subnet = g.ref_attr(vpc, "public_subnet_ids.0");
        let mt = g
            .add(
                "fs-1",
                ResourceSpec::MountTarget(MountTargetSpec {
                    file_system_id: fs_id,
                    subnet_id: subnet,
                    security_groups: vec![],
                }),
                &[],
            )
            .unwrap();

        assert!(g.requires(mt, fs));
        assert!(g.requires(mt, vpc));
        assert!(!g.requires(fs, mt));
    }

    #[test]
    fn test_topo_order_respects_edges() {
        let mut g = ResourceGraph::new();
        let vpc = g.add("vpc", vpc_spec(), &[]).unwrap();
        let fs = g
            .add("fs", ResourceSpec::FileSystem(FileSystemSpec { tags: None }), &[vpc])
            .unwrap();
        let order = g.topo_order().unwrap();
        let pos = |id: ResourceId| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(vpc) < pos(fs));
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let mut g = ResourceGraph::new();
        let err = g.add("vpc", vpc_spec(), &[ResourceId(7)]).unwrap_err();
        assert!(matches!(err, GraphError::UnknownDependency { id: 7, .. }));
    }
}
