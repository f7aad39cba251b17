//! Average-linkage dendrogram over a dissimilarity matrix, plus the
//! height-gap cut that turns branches into modules.

use ndarray::Array2;

use crate::cancel::CancelToken;
use crate::error::CoexnetError;

/// One agglomeration step. Child ids below `n_leaves` are leaves; higher ids
/// refer to earlier merges at `id - n_leaves`.
#[derive(Debug, Clone)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct Dendrogram {
    pub n_leaves: usize,
    pub merges: Vec<Merge>,
}

impl Dendrogram {
    pub fn root(&self) -> Option<usize> {
        if self.n_leaves == 0 {
            None
        } else if self.merges.is_empty() {
            Some(0)
        } else {
            Some(self.n_leaves + self.merges.len() - 1)
        }
    }

    pub fn height(&self, node: usize) -> f64 {
        if node < self.n_leaves {
            0.0
        } else {
            self.merges[node - self.n_leaves].height
        }
    }

    pub fn size(&self, node: usize) -> usize {
        if node < self.n_leaves {
            1
        } else {
            self.merges[node - self.n_leaves].size
        }
    }

    pub fn leaves_under(&self, node: usize, out: &mut Vec<usize>) {
        if node < self.n_leaves {
            out.push(node);
        } else {
            let merge = &self.merges[node - self.n_leaves];
            self.leaves_under(merge.left, out);
            self.leaves_under(merge.right, out);
        }
    }
}

/// Agglomerates leaves under average linkage. Clusters merge in order of
/// increasing distance, so merge heights never decrease.
pub fn average_linkage(
    dissimilarity: &Array2<f64>,
    cancel: &CancelToken,
) -> Result<Dendrogram, CoexnetError> {
    let n = dissimilarity.nrows();
    if dissimilarity.ncols() != n {
        return Err(CoexnetError::Numerical(format!(
            "dissimilarity matrix must be square, got {}x{}",
            n,
            dissimilarity.ncols()
        )));
    }
    if n == 0 {
        return Err(CoexnetError::Numerical(
            "cannot cluster an empty dissimilarity matrix".to_string(),
        ));
    }

    let mut dist: Vec<f64> = dissimilarity.iter().copied().collect();
    let mut size = vec![1usize; n];
    // Dendrogram node currently held by each slot.
    let mut node: Vec<usize> = (0..n).collect();
    let mut active: Vec<usize> = (0..n).collect();
    let mut merges: Vec<Merge> = Vec::with_capacity(n.saturating_sub(1));

    while active.len() > 1 {
        cancel.check("module clustering")?;
        let mut best = f64::INFINITY;
        let mut slot_a = active[0];
        let mut slot_b = active[1];
        for (ai, &a) in active.iter().enumerate() {
            for &b in &active[ai + 1..] {
                let d = dist[a * n + b];
                if d < best {
                    best = d;
                    slot_a = a;
                    slot_b = b;
                }
            }
        }

        let merged_size = size[slot_a] + size[slot_b];
        merges.push(Merge {
            left: node[slot_a],
            right: node[slot_b],
            height: best,
            size: merged_size,
        });

        let wa = size[slot_a] as f64;
        let wb = size[slot_b] as f64;
        for &c in &active {
            if c == slot_a || c == slot_b {
                continue;
            }
            let d = (dist[slot_a * n + c] * wa + dist[slot_b * n + c] * wb) / (wa + wb);
            dist[slot_a * n + c] = d;
            dist[c * n + slot_a] = d;
        }
        size[slot_a] = merged_size;
        node[slot_a] = n + merges.len() - 1;
        active.retain(|&c| c != slot_b);
    }

    Ok(Dendrogram {
        n_leaves: n,
        merges,
    })
}

/// Cuts the dendrogram into modules wherever a merge sits well above its
/// children: a node splits when its height exceeds the taller child by at
/// least `split_sensitivity` and at least one child is large enough to form
/// a module on its own. Branches below `min_module_size` stay unassigned.
pub fn dynamic_cut(
    dendrogram: &Dendrogram,
    min_module_size: usize,
    split_sensitivity: f64,
) -> Vec<Option<usize>> {
    let mut assignments = vec![None; dendrogram.n_leaves];
    let Some(root) = dendrogram.root() else {
        return assignments;
    };
    let mut next_module = 0usize;
    cut_node(
        dendrogram,
        root,
        min_module_size,
        split_sensitivity,
        &mut next_module,
        &mut assignments,
    );
    assignments
}

fn cut_node(
    dendrogram: &Dendrogram,
    node: usize,
    min_module_size: usize,
    split_sensitivity: f64,
    next_module: &mut usize,
    assignments: &mut [Option<usize>],
) {
    if node < dendrogram.n_leaves {
        assign_branch(dendrogram, node, min_module_size, next_module, assignments);
        return;
    }
    let merge = &dendrogram.merges[node - dendrogram.n_leaves];
    let child_height = dendrogram
        .height(merge.left)
        .max(dendrogram.height(merge.right));
    let gap = merge.height - child_height;
    let viable = [merge.left, merge.right]
        .iter()
        .filter(|&&child| dendrogram.size(child) >= min_module_size)
        .count();
    if gap >= split_sensitivity && viable >= 1 {
        for child in [merge.left, merge.right] {
            if dendrogram.size(child) >= min_module_size {
                cut_node(
                    dendrogram,
                    child,
                    min_module_size,
                    split_sensitivity,
                    next_module,
                    assignments,
                );
            }
            // Leaves of an undersized side keep their None assignment.
        }
    } else {
        assign_branch(dendrogram, node, min_module_size, next_module, assignments);
    }
}

fn assign_branch(
    dendrogram: &Dendrogram,
    node: usize,
    min_module_size: usize,
    next_module: &mut usize,
    assignments: &mut [Option<usize>],
) {
    let mut leaves = Vec::new();
    dendrogram.leaves_under(node, &mut leaves);
    if leaves.len() < min_module_size {
        return;
    }
    let id = *next_module;
    *next_module += 1;
    for leaf in leaves {
        assignments[leaf] = Some(id);
    }
}
