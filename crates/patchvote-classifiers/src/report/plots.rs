use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Bar, Histogram, Plot};

use crate::config::TARGET_CLASS;
use crate::error::{PatchvoteError, Result};
use crate::report::metrics::ConfusionMatrix;

/// Overlaid histograms of patch distances, split by ground-truth class.
pub fn plot_distance_histogram(distances: &[f64], classes: &[u8], title: &str) -> Result<Plot> {
    if distances.len() != classes.len() {
        return Err(PatchvoteError::DimensionMismatch {
            context: "Distances and classes must have the same length".to_string(),
            expected: distances.len(),
            found: classes.len(),
        });
    }

    let mut target = Vec::new();
    let mut other = Vec::new();
    for (&d, &c) in distances.iter().zip(classes) {
        if c == TARGET_CLASS {
            target.push(d);
        } else {
            other.push(d);
        }
    }

    let trace_target = Histogram::new(target).name("Target artist").opacity(0.6);
    let trace_other = Histogram::new(other).name("Other").opacity(0.6);

    let layout = Layout::new()
        .title(title)
        .bar_mode(BarMode::Overlay)
        .x_axis(Axis::new().title("Decision distance"))
        .y_axis(Axis::new().title("Patches"));

    let mut plot = Plot::new();
    plot.add_trace(trace_target);
    plot.add_trace(trace_other);
    plot.set_layout(layout);
    Ok(plot)
}

/// Grouped bars of verdict counts per true class.
pub fn plot_confusion_bars(cm: &ConfusionMatrix, title: &str) -> Plot {
    let truths = vec!["true 0".to_string(), "true 1".to_string()];
    let predicted_other = vec![cm.counts[0][0], cm.counts[1][0]];
    let predicted_target = vec![cm.counts[0][1], cm.counts[1][1]];

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(truths.clone(), predicted_other).name("verdict 0"));
    plot.add_trace(Bar::new(truths, predicted_target).name("verdict 1"));
    plot.set_layout(
        Layout::new()
            .title(title)
            .bar_mode(BarMode::Group)
            .y_axis(Axis::new().title("Groups")),
    );
    plot
}
