//! Pairwise-correlation feature filter.

/// Pearson correlation of two equal-length columns.
///
/// Returns `NaN` when either column is constant.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    sxy / (sxx * syy).sqrt()
}

/// Absolute correlation matrix; undefined correlations count as zero.
fn abs_correlations(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let p = columns.len();
    let mut corr = vec![vec![0.0; p]; p];
    for i in 0..p {
        for j in (i + 1)..p {
            let r = pearson(&columns[i], &columns[j]).abs();
            let r = if r.is_finite() { r.min(1.0) } else { 0.0 };
            corr[i][j] = r;
            corr[j][i] = r;
        }
    }
    corr
}

/// Select columns to drop so no surviving pair has `|r| > threshold`.
///
/// Repeatedly takes the most correlated surviving pair (earliest pair on
/// ties) and drops the member with the higher mean absolute correlation to
/// the other survivors; on equal means the later column is dropped.
/// Returns dropped column positions in ascending order.
pub(crate) fn correlated_columns(columns: &[Vec<f64>], threshold: f64) -> Vec<usize> {
    let p = columns.len();
    let corr = abs_correlations(columns);
    let mut alive = vec![true; p];
    let mut dropped = Vec::new();

    let mean_corr = |k: usize, alive: &[bool]| -> f64 {
        let others: Vec<f64> = (0..p)
            .filter(|&o| o != k && alive[o])
            .map(|o| corr[k][o])
            .collect();
        if others.is_empty() {
            0.0
        } else {
            others.iter().sum::<f64>() / others.len() as f64
        }
    };

    loop {
        let mut worst: Option<(usize, usize, f64)> = None;
        for i in (0..p).filter(|&i| alive[i]) {
            for j in ((i + 1)..p).filter(|&j| alive[j]) {
                let r = corr[i][j];
                if r > threshold && worst.is_none_or(|(_, _, w)| r > w) {
                    worst = Some((i, j, r));
                }
            }
        }
        let Some((i, j, _)) = worst else { break };
        let drop = if mean_corr(i, &alive) > mean_corr(j, &alive) { i } else { j };
        alive[drop] = false;
        dropped.push(drop);
    }

    dropped.sort_unstable();
    dropped
}
