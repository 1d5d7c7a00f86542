pub mod graph {
    use std::convert::TryFrom;
    use std::fmt;

    use thiserror::Error;

    use crate::cycle;

    #[derive(Error, Debug, PartialEq, Eq)]
    pub enum GraphError {
        #[error("Invalid edge ({from} -> {to}): endpoints must lie in [0, {vertex_count})")]
        InvalidEdgeBounds { from: i64, to: i64, vertex_count: usize },
    }

    /// Directed graph over the vertices `0..vertex_count`, stored as
    /// adjacency lists in edge insertion order. Duplicate edges and
    /// self-loops are kept as given.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DirectedGraph {
        adjacency_list: Vec<Vec<usize>>
    }

    impl DirectedGraph {
        pub fn new(vertices: usize) -> DirectedGraph {
            DirectedGraph {
                adjacency_list: vec![vec![]; vertices],
            }
        }

        /// Appends `to` to the adjacency list of `from`.
        ///
        /// Both endpoints must already be known to lie in `0..vertex_count()`;
        /// use [`DirectedGraph::try_add_edge`] for unchecked input.
        pub fn add_edge(&mut self, from: usize, to: usize) {
            self.adjacency_list[from].push(to);
        }

        pub fn add_edges(&mut self, from: usize, outgoing_edges: &[usize]) {
            self.adjacency_list[from].extend_from_slice(outgoing_edges);
        }

        /// Adds the edge only if both endpoints are in bounds, leaving the
        /// graph untouched otherwise.
        pub fn try_add_edge(&mut self, from: i64, to: i64) -> Result<(), GraphError> {
            match (self.index_of(from), self.index_of(to)) {
                (Some(from), Some(to)) => {
                    self.add_edge(from, to);
                    Ok(())
                }
                _ => Err(GraphError::InvalidEdgeBounds {
                    from,
                    to,
                    vertex_count: self.vertex_count(),
                }),
            }
        }

        fn index_of(&self, vertex: i64) -> Option<usize> {
            usize::try_from(vertex).ok().filter(|&index| index < self.vertex_count())
        }

        pub fn neighbors(&self, vertex: usize) -> &[usize] {
            &self.adjacency_list[vertex]
        }

        pub fn vertex_count(&self) -> usize {
            self.adjacency_list.len()
        }

        pub fn edge_count(&self) -> usize {
            self.adjacency_list.iter().map(Vec::len).sum()
        }

        pub fn topological_sort(&self) -> Option<Vec<usize>> {
            cycle::kahn(self).into_order()
        }
    }

    impl fmt::Display for DirectedGraph {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            for (vertex, adj_list) in self.adjacency_list.iter().enumerate() {
                write!(f, "{}:", vertex)?;
                for neighbor in adj_list {
                    write!(f, " {}", neighbor)?;
                }
                writeln!(f)?;
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use crate::graph::{DirectedGraph, GraphError};

        #[test]
        fn create_new_graph() {
            let graph = DirectedGraph::new(10);
            assert_eq!(10, graph.vertex_count());
            assert_eq!(0, graph.edge_count());
            assert!(graph.neighbors(9).is_empty());
        }

        #[test]
        fn add_edges() {
            let mut graph = DirectedGraph::new(10);
            graph.add_edges(0, &[1, 2, 3]);
            graph.add_edges(1, &[2, 3]);
            graph.add_edge(2, 3);

            assert_eq!(&[1, 2, 3], graph.neighbors(0));
            assert_eq!(&[2, 3], graph.neighbors(1));
            assert_eq!(&[3], graph.neighbors(2));
            assert_eq!(6, graph.edge_count());
        }

        #[test]
        fn keeps_duplicates_and_self_loops_in_insertion_order() {
            let mut graph = DirectedGraph::new(2);
            graph.add_edge(0, 1);
            graph.add_edge(0, 0);
            graph.add_edge(0, 1);

            assert_eq!(&[1, 0, 1], graph.neighbors(0));
        }

        #[test]
        fn try_add_edge_rejects_out_of_bounds() {
            let mut graph = DirectedGraph::new(3);

            assert_eq!(Err(GraphError::InvalidEdgeBounds { from: 0, to: 3, vertex_count: 3 }),
                       graph.try_add_edge(0, 3));
            assert_eq!(Err(GraphError::InvalidEdgeBounds { from: -1, to: 2, vertex_count: 3 }),
                       graph.try_add_edge(-1, 2));
            assert_eq!(0, graph.edge_count());

            assert_eq!(Ok(()), graph.try_add_edge(2, 0));
            assert_eq!(&[0], graph.neighbors(2));
        }

        #[test]
        fn try_add_edge_on_empty_graph() {
            let mut graph = DirectedGraph::new(0);
            assert!(graph.try_add_edge(0, 0).is_err());
        }

        #[test]
        fn display_adjacency_list() {
            let mut graph = DirectedGraph::new(3);
            graph.add_edges(0, &[1, 2]);
            graph.add_edge(2, 0);

            assert_eq!("0: 1 2\n1:\n2: 0\n", graph.to_string());
        }

        #[test]
        fn test_topo_sort_simple_graph() {
            let mut graph = DirectedGraph::new(5);
            graph.add_edges(0, &[1, 2, 3]);
            graph.add_edges(1, &[2, 3]);
            graph.add_edges(2, &[3]);

            let sorted_vertices = graph.topological_sort();
            assert_eq!(Some(vec![0, 4, 1, 2, 3]), sorted_vertices);
        }

        #[test]
        fn test_topo_sort_circle() {
            let mut graph = DirectedGraph::new(2);
            graph.add_edges(0, &[1]);
            graph.add_edges(1, &[0]);

            let sorted_vertices = graph.topological_sort();
            assert_eq!(None, sorted_vertices);
        }
    }
}

/// Cycle detection over a [`DirectedGraph`](crate::graph::DirectedGraph).
///
/// Two independent checkers are provided: a depth-first walk that tracks
/// the vertices on the active path, and Kahn's elimination by indegree.
/// Both must agree on whether a cycle exists.
pub mod cycle {
    use std::collections::vec_deque::VecDeque;

    use tracing::debug;

    use crate::graph::DirectedGraph;

    /// Result of running Kahn's elimination over a graph.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct KahnOutcome {
        vertex_count: usize,
        order: Vec<usize>,
    }

    impl KahnOutcome {
        /// Number of vertices dequeued before the queue ran dry.
        pub fn processed(&self) -> usize {
            self.order.len()
        }

        /// Vertices in the order they were dequeued.
        pub fn order(&self) -> &[usize] {
            &self.order
        }

        pub fn has_cycle(&self) -> bool {
            self.processed() < self.vertex_count
        }

        /// The full topological order, or `None` when some vertex was never
        /// released.
        pub fn into_order(self) -> Option<Vec<usize>> {
            if self.has_cycle() {
                None
            } else {
                Some(self.order)
            }
        }
    }

    pub fn kahn(graph: &DirectedGraph) -> KahnOutcome {
        let vertex_count = graph.vertex_count();
        let mut in_degrees: Vec<usize> = vec![0; vertex_count];
        for vertex in 0..vertex_count {
            for &neighbor in graph.neighbors(vertex) {
                in_degrees[neighbor] += 1;
            }
        }

        let mut vertices_with_no_incoming: VecDeque<usize> = VecDeque::with_capacity(vertex_count);
        for (vertex, in_degree) in in_degrees.iter().enumerate() {
            if *in_degree == 0 {
                vertices_with_no_incoming.push_back(vertex);
            }
        }

        let mut order: Vec<usize> = Vec::with_capacity(vertex_count);
        while let Some(vertex) = vertices_with_no_incoming.pop_front() {
            order.push(vertex);

            for &neighbor in graph.neighbors(vertex) {
                in_degrees[neighbor] -= 1;

                if in_degrees[neighbor] == 0 {
                    vertices_with_no_incoming.push_back(neighbor);
                }
            }
        }

        debug!(vertices = vertex_count, processed = order.len(), "kahn elimination finished");
        KahnOutcome { vertex_count, order }
    }

    pub fn has_cycle_kahn(graph: &DirectedGraph) -> bool {
        kahn(graph).has_cycle()
    }

    pub fn has_cycle_dfs(graph: &DirectedGraph) -> bool {
        find_cycle(graph).is_some()
    }

    /// Depth-first search for a back-edge, starting from every unvisited
    /// vertex in ascending order and following neighbors in insertion order.
    ///
    /// Returns the first cycle found as a closed path: it starts at the
    /// target of the back-edge, follows the active DFS path, and ends with
    /// that same vertex again. A self-loop on `u` is reported as `[u, u]`.
    ///
    /// The walk uses an explicit stack of `(vertex, next neighbor)` frames,
    /// so depth is bounded by heap rather than by the call stack.
    pub fn find_cycle(graph: &DirectedGraph) -> Option<Vec<usize>> {
        let vertex_count = graph.vertex_count();
        let mut visited = vec![false; vertex_count];
        let mut on_stack = vec![false; vertex_count];
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for start in 0..vertex_count {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            on_stack[start] = true;
            stack.push((start, 0));

            while let Some(frame) = stack.last_mut() {
                let (vertex, next) = *frame;
                let neighbors = graph.neighbors(vertex);

                if next == neighbors.len() {
                    // backtrack
                    on_stack[vertex] = false;
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let neighbor = neighbors[next];
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    on_stack[neighbor] = true;
                    stack.push((neighbor, 0));
                } else if on_stack[neighbor] {
                    let cycle = close_cycle(&stack, neighbor);
                    debug!(vertices = vertex_count, length = cycle.len() - 1, "dfs found back-edge");
                    return Some(cycle);
                }
            }
        }

        debug!(vertices = vertex_count, "dfs found no cycle");
        None
    }

    fn close_cycle(stack: &[(usize, usize)], entry: usize) -> Vec<usize> {
        let path = stack.iter().map(|&(vertex, _)| vertex);
        let mut cycle: Vec<usize> = path.skip_while(|&vertex| vertex != entry).collect();
        cycle.push(entry);
        cycle
    }

}
