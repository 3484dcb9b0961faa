//! Stateful 2D line figure.
//!
//! A [`Figure`] owns its lines. Callers create them once with [`Figure::plot`], then
//! animate by replacing y-data through the returned [`LineHandle`]s and redrawing.
//! Axis limits are fixed when the lines are created; later `set_ydata` calls do not
//! rescale the axes.

use std::ops::Range;
use std::path::Path;

use anyhow::Context;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Extension of saved frames. Frames are SVG so that titles and legends render
/// without system font libraries.
pub const FRAME_EXTENSION: &str = "svg";

/// Opaque reference to a line owned by a [`Figure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHandle(usize);

impl LineHandle {
    /// Handle of the `idx`-th line plotted on a figure.
    pub fn from_index(idx: usize) -> Self {
        LineHandle(idx)
    }
}

struct Line {
    y: Vec<f64>,
    color: RGBColor,
}

pub struct Figure {
    size: (u32, u32),
    x: Vec<f64>,
    lines: Vec<Line>,
    legend: Vec<String>,
    title: String,
    x_range: Range<f64>,
    y_range: Range<f64>,
    canvas: String,
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            x: Vec::new(),
            lines: Vec::new(),
            legend: Vec::new(),
            title: String::new(),
            x_range: 0.0..1.0,
            y_range: 0.0..1.0,
            canvas: String::new(),
        }
    }

    /// Add one line per `(y, color)` series over the shared `x` and fix the axis limits.
    pub fn plot(&mut self, x: &[f64], series: &[(&[f64], RGBColor)]) -> anyhow::Result<Vec<LineHandle>> {
        anyhow::ensure!(!x.is_empty(), "cannot plot an empty series");
        for (y, _) in series {
            anyhow::ensure!(y.len() == x.len(), "y.len ({}) != x.len ({})", y.len(), x.len());
        }

        self.x = x.to_vec();
        let first = self.lines.len();
        self.lines.extend(series.iter().map(|(y, color)| Line { y: y.to_vec(), color: *color }));

        self.x_range = padded_range(self.x.iter().copied(), 0.0);
        self.y_range = padded_range(self.lines.iter().flat_map(|l| l.y.iter().copied()), 0.05);

        Ok((first..self.lines.len()).map(LineHandle).collect())
    }

    /// Replace the y-data of an existing line in place.
    pub fn set_ydata(&mut self, handle: LineHandle, y: &[f64]) -> anyhow::Result<()> {
        anyhow::ensure!(y.len() == self.x.len(), "y.len ({}) != x.len ({})", y.len(), self.x.len());
        let line = self
            .lines
            .get_mut(handle.0)
            .with_context(|| format!("unknown line handle {:?}", handle))?;
        line.y.clear();
        line.y.extend_from_slice(y);
        Ok(())
    }

    pub fn ydata(&self, handle: LineHandle) -> Option<&[f64]> {
        self.lines.get(handle.0).map(|l| l.y.as_slice())
    }

    pub fn set_legend(&mut self, labels: &[&str]) {
        self.legend = labels.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Re-render the current lines, legend and title into the in-memory canvas.
    pub fn draw(&mut self) -> anyhow::Result<()> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, self.size).into_drawing_area();
            self.render(&root)?;
        }
        self.canvas = buf;
        Ok(())
    }

    /// SVG text of the most recent [`Figure::draw`].
    pub fn canvas(&self) -> &str {
        &self.canvas
    }

    /// Render the figure as SVG to `path`, which must end in `.svg`.
    pub fn savefig(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        anyhow::ensure!(
            path.extension().and_then(|e| e.to_str()) == Some(FRAME_EXTENSION),
            "figures are saved as .{} only (path={:?})",
            FRAME_EXTENSION,
            path
        );
        let root = SVGBackend::new(path, self.size).into_drawing_area();
        self.render(&root)
            .with_context(|| format!("save figure failed (path={:?})", path))
    }

    fn render<DB>(&self, root: &DrawingArea<DB, Shift>) -> anyhow::Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption(&self.title, ("sans-serif", 24))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())?;

        chart.configure_mesh().x_desc("t (days)").draw()?;

        for (idx, line) in self.lines.iter().enumerate() {
            let color = line.color;
            let series = chart.draw_series(LineSeries::new(
                self.x.iter().copied().zip(line.y.iter().copied()),
                color.stroke_width(2),
            ))?;
            if let Some(label) = self.legend.get(idx) {
                series
                    .label(label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }
        }

        if !self.legend.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

fn padded_range(values: impl Iterator<Item = f64>, pad_frac: f64) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = (pad_frac * (hi - lo)).max(1e-9);
    if hi > lo { (lo - pad)..(hi + pad) } else { (lo - 0.5)..(hi + 0.5) }
}
