//! Zero-variance feature filter.

/// Positions among `candidates` whose column holds a single repeated value.
pub(crate) fn zero_variance_columns(columns: &[Vec<f64>], candidates: &[usize]) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&c| {
            let column = &columns[c];
            column.first().is_none_or(|&v0| column.iter().all(|&v| v == v0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_constant_candidates_flagged() {
        let columns = vec![vec![1.0, 1.0], vec![1.0, 2.0], vec![0.0, 0.0]];
        assert_eq!(zero_variance_columns(&columns, &[0, 1, 2]), vec![0, 2]);
        assert_eq!(zero_variance_columns(&columns, &[1, 2]), vec![2]);
    }
}
