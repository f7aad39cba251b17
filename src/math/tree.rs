//! Depth-limited CART tree for the ensemble refiner.

use std::cmp::Ordering;

use ndarray::ArrayView2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy)]
pub struct TreeOptions {
    pub max_depth: usize,
    /// Random candidate features per split.
    pub mtry: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        class: u8,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary classification tree trained on Gini impurity. Rows are bootstrap
/// sample indices into `x` (samples × features); repeats are expected.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn fit(
        x: &ArrayView2<'_, f64>,
        y: &[u8],
        rows: Vec<usize>,
        opts: &TreeOptions,
        rng: &mut ChaCha8Rng,
        importance: &mut [f64],
    ) -> Self {
        let mut nodes = Vec::new();
        let root_len = rows.len().max(1) as f64;
        build(x, y, rows, 0, opts, rng, importance, root_len, &mut nodes);
        Self { nodes }
    }

    pub fn predict(&self, x: &ArrayView2<'_, f64>, sample: usize) -> u8 {
        let mut at = self.nodes.len() - 1;
        loop {
            match &self.nodes[at] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if x[[sample, *feature]] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

#[allow(clippy::too_many_arguments)]
fn build(
    x: &ArrayView2<'_, f64>,
    y: &[u8],
    rows: Vec<usize>,
    depth: usize,
    opts: &TreeOptions,
    rng: &mut ChaCha8Rng,
    importance: &mut [f64],
    root_len: f64,
    nodes: &mut Vec<Node>,
) -> usize {
    let counts = class_counts(y, &rows);
    let majority = if counts[1] > counts[0] { 1 } else { 0 };
    if rows.len() < 2 || depth >= opts.max_depth || counts[0] == 0 || counts[1] == 0 {
        nodes.push(Node::Leaf { class: majority });
        return nodes.len() - 1;
    }
    let features = feature_subset(x.ncols(), opts.mtry, rng);
    let Some(split) = best_split(x, y, &rows, &features) else {
        nodes.push(Node::Leaf { class: majority });
        return nodes.len() - 1;
    };
    // Mean-decrease-impurity contribution, weighted by the node's share of
    // the bootstrap sample.
    importance[split.feature] += split.decrease * rows.len() as f64 / root_len;
    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&r| x[[r, split.feature]] <= split.threshold);
    let left = build(
        x, y, left_rows, depth + 1, opts, rng, importance, root_len, nodes,
    );
    let right = build(
        x, y, right_rows, depth + 1, opts, rng, importance, root_len, nodes,
    );
    nodes.push(Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    });
    nodes.len() - 1
}

/// Partial Fisher-Yates draw of `mtry` distinct feature indices.
fn feature_subset(n_features: usize, mtry: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let take = mtry.min(n_features).max(1);
    let mut pool: Vec<usize> = (0..n_features).collect();
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        pool.swap(i, j);
    }
    pool.truncate(take);
    pool
}

fn best_split(
    x: &ArrayView2<'_, f64>,
    y: &[u8],
    rows: &[usize],
    features: &[usize],
) -> Option<Split> {
    let n = rows.len() as f64;
    let parent_counts = class_counts(y, rows);
    let parent_gini = gini(parent_counts, rows.len());
    let mut best: Option<Split> = None;
    let mut pairs: Vec<(f64, u8)> = Vec::with_capacity(rows.len());
    for &feature in features {
        pairs.clear();
        pairs.extend(rows.iter().map(|&r| (x[[r, feature]], y[r])));
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        let mut left = [0usize; 2];
        for i in 1..pairs.len() {
            left[pairs[i - 1].1 as usize] += 1;
            if pairs[i].0 <= pairs[i - 1].0 {
                continue;
            }
            let right = [parent_counts[0] - left[0], parent_counts[1] - left[1]];
            let nl = i;
            let nr = pairs.len() - i;
            let weighted = (nl as f64 * gini(left, nl) + nr as f64 * gini(right, nr)) / n;
            let decrease = parent_gini - weighted;
            if decrease > 1e-12 && best.as_ref().is_none_or(|b| decrease > b.decrease) {
                best = Some(Split {
                    feature,
                    threshold: (pairs[i - 1].0 + pairs[i].0) / 2.0,
                    decrease,
                });
            }
        }
    }
    best
}

fn gini(counts: [usize; 2], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / total as f64;
    let p1 = counts[1] as f64 / total as f64;
    1.0 - p0 * p0 - p1 * p1
}

fn class_counts(y: &[u8], rows: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &r in rows {
        counts[y[r] as usize] += 1;
    }
    counts
}
