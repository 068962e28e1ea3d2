//! Property-based tests for closure correctness over generated graphs.

mod helpers;

use std::collections::VecDeque;

use helpers::*;
use proptest::prelude::*;
use skein_graph::test_utils::TestRuntime;
use skein_graph::{ResolveRequest, Resolver, Runtime};
use std::sync::Arc;

/// Generate a module universe: `edges[i]` lists the modules `i` references,
/// in order. Module 0 is the entry.
fn graph_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..=8).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0..n, 0..4), n))
}

fn module_path(i: usize) -> String {
    format!("/gen/m{i}.js")
}

fn build_runtime(edges: &[Vec<usize>]) -> TestRuntime {
    let mut runtime = TestRuntime::new();
    for (i, refs) in edges.iter().enumerate() {
        let content: String = refs
            .iter()
            .map(|j| format!("require('./m{j}.js');\n"))
            .collect();
        runtime = runtime.with_file(module_path(i), content);
    }
    runtime
}

/// Reference BFS over the generated edges, mirroring the resolver's
/// documented order: entry first, children in reference order, first
/// discovery wins.
fn expected_order(edges: &[Vec<usize>]) -> Vec<String> {
    let mut visited = vec![false; edges.len()];
    let mut queue = VecDeque::from([0usize]);
    visited[0] = true;
    let mut order = Vec::new();
    while let Some(i) = queue.pop_front() {
        order.push(module_path(i));
        for &j in &edges[i] {
            if !visited[j] {
                visited[j] = true;
                queue.push_back(j);
            }
        }
    }
    order
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn emitted_graph_is_exactly_the_reachable_closure(edges in graph_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let records = rt.block_on(async {
            Resolver::new(Arc::new(build_runtime(&edges)))
                .resolve(ResolveRequest::new([module_path(0)]))
                .collect()
                .await
                .unwrap()
        });

        let emitted: Vec<String> = records.iter().map(|r| r.id.as_str().to_string()).collect();
        let expected = expected_order(&edges);

        // Every reachable module exactly once, in deterministic BFS order.
        prop_assert_eq!(emitted, expected);
    }

    #[test]
    fn cached_rerun_is_equivalent_and_transform_free(edges in graph_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let runtime: Arc<dyn Runtime> = Arc::new(build_runtime(&edges));
            let counting = CountingTransform::new();
            let cache = skein_graph::CacheStore::new();

            let first = Resolver::new(Arc::clone(&runtime))
                .resolve(
                    ResolveRequest::new([module_path(0)])
                        .with_cache(cache.clone())
                        .with_chain(chain_of(counting.clone())),
                )
                .collect()
                .await
                .unwrap();
            let first_calls = counting.calls();

            let second = Resolver::new(runtime)
                .resolve(
                    ResolveRequest::new([module_path(0)])
                        .with_cache(cache)
                        .with_chain(chain_of(counting.clone())),
                )
                .collect()
                .await
                .unwrap();

            assert_eq!(counting.calls(), first_calls, "no re-transformation");
            assert_eq!(first, second);
        });
    }
}
