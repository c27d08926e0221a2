use std::collections::VecDeque;

use crate::graph::Network;
use crate::{FuzzError, Result};

#[derive(Debug, Clone, Copy)]
struct FlowArc {
    to: usize,
    cap: i64,
    rev: usize,
}

#[derive(Debug)]
pub struct MaxFlow {
    graph: Vec<Vec<FlowArc>>,
    level: Vec<i32>,
    iter: Vec<usize>,
    arc_refs: Vec<(usize, usize, i64)>,
}

impl MaxFlow {
    pub fn new(nodes: usize) -> Self {
        Self {
            graph: vec![Vec::new(); nodes],
            level: vec![-1; nodes],
            iter: vec![0; nodes],
            arc_refs: Vec::new(),
        }
    }

    /// Builds the flow network for `network` with one capacity per arc.
    pub fn from_network(network: &Network, capacity: &[i64]) -> Result<Self> {
        network.expect_arc_len("capacity", capacity.len())?;
        let mut flow = Self::new(network.node_count());
        for ((tail, head), &cap) in network.arcs().zip(capacity.iter()) {
            if cap < 0 {
                return Err(FuzzError::InvalidInput(
                    "negative arc capacity".to_string(),
                ));
            }
            flow.add_arc(tail as usize, head as usize, cap);
        }
        Ok(flow)
    }

    pub fn add_arc(&mut self, from: usize, to: usize, cap: i64) -> usize {
        let from_index = self.graph[from].len();
        let to_index = self.graph[to].len() + usize::from(from == to);
        self.graph[from].push(FlowArc {
            to,
            cap,
            rev: to_index,
        });
        self.graph[to].push(FlowArc {
            to: from,
            cap: 0,
            rev: from_index,
        });
        self.arc_refs.push((from, from_index, cap));
        self.arc_refs.len() - 1
    }

    fn bfs(&mut self, s: usize, t: usize) -> bool {
        self.level.iter_mut().for_each(|l| *l = -1);
        let mut queue = VecDeque::new();
        self.level[s] = 0;
        queue.push_back(s);
        while let Some(u) = queue.pop_front() {
            for arc in &self.graph[u] {
                if arc.cap > 0 && self.level[arc.to] < 0 {
                    self.level[arc.to] = self.level[u] + 1;
                    queue.push_back(arc.to);
                }
            }
        }
        self.level[t] >= 0
    }

    fn dfs(&mut self, u: usize, t: usize, limit: i64) -> i64 {
        if u == t {
            return limit;
        }
        while self.iter[u] < self.graph[u].len() {
            let idx = self.iter[u];
            let FlowArc { to, cap, rev } = self.graph[u][idx];
            if cap > 0 && self.level[u] < self.level[to] {
                let pushed = self.dfs(to, t, limit.min(cap));
                if pushed > 0 {
                    self.graph[u][idx].cap -= pushed;
                    self.graph[to][rev].cap += pushed;
                    return pushed;
                }
            }
            self.iter[u] += 1;
        }
        0
    }

    pub fn max_flow(&mut self, s: usize, t: usize) -> Result<i64> {
        let n = self.graph.len();
        if s >= n || t >= n {
            return Err(FuzzError::InvalidInput(
                "flow endpoint outside node range".to_string(),
            ));
        }
        if s == t {
            return Err(FuzzError::InvalidInput(
                "source and target must differ".to_string(),
            ));
        }
        let mut flow = 0_i64;
        while self.bfs(s, t) {
            self.iter.iter_mut().for_each(|i| *i = 0);
            loop {
                let pushed = self.dfs(s, t, i64::MAX);
                if pushed == 0 {
                    break;
                }
                flow += pushed;
            }
        }
        Ok(flow)
    }

    /// Flow currently routed over each arc, in insertion order.
    pub fn arc_flows(&self) -> Vec<i64> {
        self.arc_refs
            .iter()
            .map(|&(node, idx, cap)| cap - self.graph[node][idx].cap)
            .collect()
    }
}
