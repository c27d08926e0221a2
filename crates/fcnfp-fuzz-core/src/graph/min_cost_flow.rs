use crate::{FuzzError, Result};

const UNREACHABLE: i64 = i64::MAX / 4;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResidualArc {
    pub(crate) to: usize,
    pub(crate) rev: usize,
    pub(crate) cap: i64,
    pub(crate) cost: i64,
}

/// Residual graph driven by successive shortest paths.
#[derive(Debug)]
pub(crate) struct SuccessiveShortestPaths {
    pub(crate) graph: Vec<Vec<ResidualArc>>,
}

impl SuccessiveShortestPaths {
    pub(crate) fn new(nodes: usize) -> Self {
        Self {
            graph: vec![Vec::new(); nodes],
        }
    }

    /// Returns the position of the forward arc in `graph[from]`.
    pub(crate) fn add_arc(&mut self, from: usize, to: usize, cap: i64, cost: i64) -> usize {
        let from_index = self.graph[from].len();
        let to_index = self.graph[to].len() + usize::from(from == to);
        self.graph[from].push(ResidualArc {
            to,
            rev: to_index,
            cap,
            cost,
        });
        self.graph[to].push(ResidualArc {
            to: from,
            rev: from_index,
            cap: 0,
            cost: -cost,
        });
        from_index
    }

    fn shortest_path_bellman_ford(&self, source: usize) -> (Vec<i64>, Vec<usize>, Vec<usize>) {
        let n = self.graph.len();
        let mut dist = vec![UNREACHABLE; n];
        let mut prev_node = vec![usize::MAX; n];
        let mut prev_arc = vec![usize::MAX; n];
        dist[source] = 0;

        for _ in 0..n {
            let mut updated = false;
            for u in 0..n {
                let du = dist[u];
                if du >= UNREACHABLE {
                    continue;
                }
                for (arc_idx, arc) in self.graph[u].iter().enumerate() {
                    if arc.cap <= 0 {
                        continue;
                    }
                    let nd = du.saturating_add(arc.cost);
                    if nd < dist[arc.to] {
                        dist[arc.to] = nd;
                        prev_node[arc.to] = u;
                        prev_arc[arc.to] = arc_idx;
                        updated = true;
                    }
                }
            }
            if !updated {
                break;
            }
        }
        (dist, prev_node, prev_arc)
    }

    /// Arcs of the cheapest residual path, as `(node, arc index)` pairs from sink back to source.
    fn augmenting_path(&self, source: usize, sink: usize) -> Option<Vec<(usize, usize)>> {
        let (dist, prev_node, prev_arc) = self.shortest_path_bellman_ford(source);
        if dist[sink] >= UNREACHABLE {
            return None;
        }
        let mut path = Vec::new();
        let mut v = sink;
        while v != source {
            let (u, arc) = (prev_node[v], prev_arc[v]);
            if u == usize::MAX || arc == usize::MAX {
                return None;
            }
            path.push((u, arc));
            v = u;
        }
        Some(path)
    }

    /// Pushes `flow` units from `source` to `sink`, cheapest augmenting path first, and
    /// returns the total cost.
    pub(crate) fn run(&mut self, source: usize, sink: usize, mut flow: i64) -> Result<i128> {
        let mut total_cost: i128 = 0;
        while flow > 0 {
            let path = self
                .augmenting_path(source, sink)
                .ok_or(FuzzError::Infeasible)?;
            let push = path
                .iter()
                .map(|&(u, arc)| self.graph[u][arc].cap)
                .fold(flow, i64::min);
            for (u, arc) in path {
                let ResidualArc { to, rev, cost, .. } = self.graph[u][arc];
                self.graph[u][arc].cap -= push;
                self.graph[to][rev].cap += push;
                total_cost += i128::from(cost) * i128::from(push);
            }
            flow -= push;
        }
        Ok(total_cost)
    }
}
