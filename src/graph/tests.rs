use super::*;
use crate::namer::ModuleId;

fn mid(n: &str) -> ModuleId {
    ModuleId::from_fqn(n)
}

#[test]
fn test_add_edge_mirrors_reverse() {
    let mut graph = DependencyGraph::new();
    graph.add_edge(mid("rp1"), mid("dr1"));

    assert!(graph.dependencies_of(mid("rp1")).unwrap().contains(&mid("dr1")));
    assert!(graph.dependents_of(mid("dr1")).unwrap().contains(&mid("rp1")));
    assert!(graph.is_consistent());
}

#[test]
fn test_duplicate_edge_is_idempotent() {
    let mut graph = DependencyGraph::new();
    graph.add_edge(mid("rp1"), mid("dr1"));
    graph.add_edge(mid("rp1"), mid("dr1"));

    assert_eq!(graph.dependencies_of(mid("rp1")).unwrap().len(), 1);
    assert_eq!(graph.dependents_of(mid("dr1")).unwrap().len(), 1);
}

#[test]
fn test_remove_dependencies_cleans_reverse_entries() {
    let mut graph = DependencyGraph::new();
    graph.add_edge(mid("rp1"), mid("dr1"));
    graph.add_edge(mid("rp1"), mid("dr2"));
    graph.add_edge(mid("rp2"), mid("dr1"));

    graph.remove_dependencies(mid("rp1"));

    assert!(graph.dependencies_of(mid("rp1")).is_none());
    // dr1 still referenced by rp2, dr2 no longer referenced at all
    assert!(graph.dependents_of(mid("dr1")).unwrap().contains(&mid("rp2")));
    assert!(!graph.dependents_of(mid("dr1")).unwrap().contains(&mid("rp1")));
    assert!(graph.dependents_of(mid("dr2")).is_none());
    assert!(graph.is_consistent());
}

#[test]
fn test_remove_keeps_incoming_edges() {
    let mut graph = DependencyGraph::new();
    graph.add_edge(mid("rp1"), mid("dr1"));

    // Removing dr1's (empty) outgoing edges leaves rp1 -> dr1 intact
    graph.remove_dependencies(mid("dr1"));

    assert!(graph.dependencies_of(mid("rp1")).unwrap().contains(&mid("dr1")));
    assert!(graph.dependents_of(mid("dr1")).unwrap().contains(&mid("rp1")));
    assert!(graph.is_consistent());
}

#[test]
fn test_clear() {
    let mut graph = DependencyGraph::new();
    graph.add_edge(mid("rp1"), mid("dr1"));

    graph.clear();

    assert!(graph.dependencies_of(mid("rp1")).is_none());
    assert!(graph.dependents_of(mid("dr1")).is_none());
    assert!(graph.is_consistent());
}
