//! Pearson correlation over pairwise-complete observations.

/// Pearson's r of the pairs where both values are present and finite.
///
/// `None` when fewer than two complete pairs remain or either side has
/// zero variance.
pub fn pearson(pairs: &[(Option<f64>, Option<f64>)]) -> Option<f64> {
    let complete: Vec<(f64, f64)> = pairs
        .iter()
        .filter_map(|&(x, y)| Some((x?, y?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if complete.len() < 2 {
        return None;
    }

    let n = complete.len() as f64;
    let mean_x = complete.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = complete.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &complete {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
