//! SVG figures for the evaluation report
//!
//! Built with `plotters` when the `plots` feature is enabled (the default);
//! otherwise drawing is skipped with a log line.

use crate::errors::Result;
use crate::metrics::{ConfusionMatrix, RocPoint};
use std::path::Path;

#[cfg(feature = "plots")]
mod svg {
    use super::*;
    use crate::errors::TrainerError;
    use plotters::prelude::*;

    type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn prepare(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn confusion_matrix(cm: &ConfusionMatrix, path: &Path) -> Result<()> {
        prepare(path)?;
        draw_confusion(cm, path).map_err(|e| TrainerError::Plot(e.to_string()))
    }

    pub fn roc_curve(points: &[RocPoint], auc: Option<f64>, path: &Path) -> Result<()> {
        prepare(path)?;
        draw_roc(points, auc, path).map_err(|e| TrainerError::Plot(e.to_string()))
    }

    fn draw_confusion(cm: &ConfusionMatrix, path: &Path) -> DrawResult {
        let root = SVGBackend::new(path, (520, 480)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Confusion matrix", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..2f64, 0f64..2f64)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Predicted")
            .y_desc("Actual")
            .x_labels(3)
            .y_labels(3)
            .draw()?;

        // Actual 0 on the top row, predicted 0 in the left column.
        let cells = [
            (0.0, 1.0, cm.tn),
            (1.0, 1.0, cm.fp),
            (0.0, 0.0, cm.fn_),
            (1.0, 0.0, cm.tp),
        ];
        let max = cells.iter().map(|c| c.2).max().unwrap_or(0).max(1) as f64;

        chart.draw_series(cells.iter().map(|&(x, y, count)| {
            let shade = 255 - (200.0 * count as f64 / max) as u8;
            Rectangle::new([(x, y), (x + 1.0, y + 1.0)], RGBColor(shade, shade, 255).filled())
        }))?;
        chart.draw_series(cells.iter().map(|&(x, y, count)| {
            Text::new(count.to_string(), (x + 0.45, y + 0.55), ("sans-serif", 28).into_font())
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_roc(points: &[RocPoint], auc: Option<f64>, path: &Path) -> DrawResult {
        let root = SVGBackend::new(path, (560, 480)).into_drawing_area();
        root.fill(&WHITE)?;

        let caption = match auc {
            Some(auc) => format!("ROC curve (AUC = {auc:.3})"),
            None => "ROC curve (AUC undefined)".to_string(),
        };
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;

        chart
            .configure_mesh()
            .x_desc("False positive rate")
            .y_desc("True positive rate")
            .draw()?;

        chart.draw_series(LineSeries::new(vec![(0.0, 0.0), (1.0, 1.0)], &RGBColor(180, 180, 180)))?;
        chart.draw_series(LineSeries::new(points.iter().map(|p| (p.fpr, p.tpr)), &BLUE))?;

        root.present()?;
        Ok(())
    }
}

/// Write the confusion-matrix figure to `path`.
pub fn confusion_matrix_svg(cm: &ConfusionMatrix, path: &Path) -> Result<()> {
    #[cfg(feature = "plots")]
    {
        svg::confusion_matrix(cm, path)?;
        tracing::info!("Confusion matrix saved to: {}", path.display());
    }
    #[cfg(not(feature = "plots"))]
    tracing::warn!(?cm, path = %path.display(), "plots feature disabled, confusion matrix skipped");
    Ok(())
}

/// Write the ROC-curve figure to `path`.
pub fn roc_curve_svg(points: &[RocPoint], auc: Option<f64>, path: &Path) -> Result<()> {
    #[cfg(feature = "plots")]
    {
        svg::roc_curve(points, auc, path)?;
        tracing::info!("ROC curve saved to: {}", path.display());
    }
    #[cfg(not(feature = "plots"))]
    tracing::warn!(points = points.len(), ?auc, path = %path.display(), "plots feature disabled, ROC curve skipped");
    Ok(())
}
