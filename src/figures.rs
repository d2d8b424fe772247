use serde::Serialize;

/// Figure payloads attached to test results.
///
/// These are plain data for a host UI to render; the crate does no drawing.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Figure {
    BoxPlot(BoxPlotFigure),
    Scatter(ScatterFigure),
    Heatmap(HeatmapFigure),
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxPlotFigure {
    pub traces: Vec<BoxTrace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxTrace {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterFigure {
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub trend_line: Option<TrendLine>,
}

/// Least-squares line over the scatter points.
#[derive(Debug, Clone, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapFigure {
    pub title: String,
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    /// -log10(p) per cell, capped at 10; `None` where p is undefined.
    pub z: Vec<Vec<Option<f64>>>,
    /// Per-cell display text for the raw p-values.
    pub text: Vec<Vec<String>>,
}

/// One box trace per group, NaN cells dropped.
pub fn box_plot(groups: &[(&str, &[f64])]) -> Figure {
    let traces = groups
        .iter()
        .map(|(name, values)| BoxTrace {
            name: name.to_string(),
            values: values.iter().copied().filter(|v| !v.is_nan()).collect(),
        })
        .collect();
    Figure::BoxPlot(BoxPlotFigure { traces })
}

/// Scatter of y against x with a least-squares trend line. The trend line is
/// omitted for degenerate inputs (fewer than 2 points or zero x variance).
pub fn scatter_plot(x_label: &str, y_label: &str, x: &[f64], y: &[f64]) -> Figure {
    Figure::Scatter(ScatterFigure {
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        x: x.to_vec(),
        y: y.to_vec(),
        trend_line: fit_trend_line(x, y),
    })
}

fn fit_trend_line(x: &[f64], y: &[f64]) -> Option<TrendLine> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let x = &x[..n];
    let y = &y[..n];
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let slope = sxy / sxx;
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Heatmap of a symmetric p-value matrix on a -log10 scale.
///
/// Cell color is -log10(p) capped at 10 (anything below 1e-10 saturates);
/// undefined cells stay empty. Cell text shows the raw p-value: "-" for
/// missing, "1.00" on the diagonal identity, scientific notation below
/// 0.001, three decimals otherwise.
pub fn p_value_heatmap(
    title: &str,
    x_labels: &[String],
    y_labels: &[String],
    p_values: &[Vec<Option<f64>>],
) -> Figure {
    let z = p_values
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Some(p) if p.is_nan() || *p <= 0.0 => None,
                    Some(p) if *p < 1e-10 => Some(10.0),
                    Some(p) => Some(-p.log10()),
                    None => None,
                })
                .collect()
        })
        .collect();

    let text = p_values
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    None => "-".to_string(),
                    Some(p) if p.is_nan() => "-".to_string(),
                    Some(p) if *p == 1.0 => "1.00".to_string(),
                    Some(p) if *p < 0.001 => format!("{:.2e}", p),
                    Some(p) => format!("{:.3}", p),
                })
                .collect()
        })
        .collect();

    Figure::Heatmap(HeatmapFigure {
        title: title.to_string(),
        x_labels: x_labels.to_vec(),
        y_labels: y_labels.to_vec(),
        z,
        text,
    })
}
