//! Property tests for the bidirectional edge invariant

use proptest::prelude::*;

use authz_index::{DeletionPolicy, Entry, Index, IndexConfig, Policy};

const ROLE_SETS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];
const RESOURCES: [&str; 4] = ["leave_request", "expenses", "travel", "equipment"];

#[derive(Debug, Clone)]
enum Op {
    AddRoleSet(usize),
    AddResource { name: usize, imports: Vec<usize> },
    DeleteRoleSet(usize),
    DeleteResource(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ROLE_SETS.len()).prop_map(Op::AddRoleSet),
        (
            0..RESOURCES.len(),
            proptest::collection::vec(0..ROLE_SETS.len(), 0..3)
        )
            .prop_map(|(name, imports)| Op::AddResource { name, imports }),
        (0..ROLE_SETS.len()).prop_map(Op::DeleteRoleSet),
        (0..RESOURCES.len()).prop_map(Op::DeleteResource),
    ]
}

fn role_set_file(idx: usize) -> String {
    format!("derived_roles/{}.json", ROLE_SETS[idx])
}

fn resource_file(idx: usize) -> String {
    format!("resource_policies/{}.json", RESOURCES[idx])
}

fn apply(index: &Index, op: Op) {
    match op {
        Op::AddRoleSet(idx) => {
            index
                .add_or_update(Entry::new(
                    role_set_file(idx),
                    Policy::derived_roles(ROLE_SETS[idx]),
                ))
                .unwrap();
        }
        Op::AddResource { name, imports } => {
            let imports = imports
                .into_iter()
                .map(|idx| ROLE_SETS[idx].to_string())
                .collect();
            index
                .add_or_update(Entry::new(
                    resource_file(name),
                    Policy::resource(RESOURCES[name], "").with_imports(imports),
                ))
                .unwrap();
        }
        // Deletes may race ahead of adds in the generated sequence; a missing
        // file is not a defect here
        Op::DeleteRoleSet(idx) => {
            let _ = index.delete(&role_set_file(idx));
        }
        Op::DeleteResource(idx) => {
            let _ = index.delete(&resource_file(idx));
        }
    }
}

proptest! {
    /// Every dependency edge is mirrored by exactly one reverse reference,
    /// whatever order mutations arrive in.
    #[test]
    fn bidirectional_consistency_under_random_mutations(
        ops in proptest::collection::vec(op_strategy(), 1..40)
    ) {
        let index = Index::empty(IndexConfig {
            deletion: DeletionPolicy::AllowDangling,
            ..IndexConfig::default()
        });

        for op in ops {
            apply(&index, op);
            prop_assert!(index.is_graph_consistent());
        }

        // The inspect snapshot agrees with the graph: dependency and
        // reference lists mirror each other file-for-file
        let snapshot = index.inspect();
        for (file, entry) in &snapshot {
            for dep in &entry.dependencies {
                prop_assert!(snapshot[dep].references.contains(file));
            }
            for referrer in &entry.references {
                prop_assert!(snapshot[referrer].dependencies.contains(file));
            }
        }
    }
}
