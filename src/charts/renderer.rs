//! Static Chart Renderer
//! Draws aggregate tables as PNG charts with plotters.
//!
//! Chart kinds:
//! - Line: time series (x = period, y = count)
//! - Bar: vertical bars for ordered buckets (hour, age group, sex, ethnicity)
//! - Horizontal bar: rankings, largest on top (crime types, weapons)
//! - Heatmap: month x neighborhood grid

use crate::stats::{CountTable, CrossTab};
use plotters::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const BAR_COLOR: RGBColor = RGBColor(70, 130, 180); // steelblue
const ACCENT_COLOR: RGBColor = RGBColor(255, 127, 80); // coral
const HEAT_LOW: (u8, u8, u8) = (255, 247, 236);
const HEAT_HIGH: (u8, u8, u8) = (179, 0, 0);

/// Most tick labels drawn on a categorical axis.
const MAX_AXIS_LABELS: usize = 12;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to draw for '{0}'")]
    Empty(String),
    #[error("Failed to create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Drawing failed: {0}")]
    Draw(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
}

/// One chart to render.
#[derive(Debug, Clone)]
pub enum ChartJob {
    Counts {
        file_name: String,
        title: String,
        kind: ChartKind,
        /// Fill bars with the accent color instead of the default.
        accent: bool,
        data: CountTable,
    },
    Heatmap {
        file_name: String,
        title: String,
        data: CrossTab,
    },
}

impl ChartJob {
    pub fn counts(file_name: &str, title: &str, kind: ChartKind, data: CountTable) -> Self {
        ChartJob::Counts {
            file_name: file_name.to_string(),
            title: title.to_string(),
            kind,
            accent: false,
            data,
        }
    }

    pub fn accented(self) -> Self {
        match self {
            ChartJob::Counts {
                file_name,
                title,
                kind,
                data,
                ..
            } => ChartJob::Counts {
                file_name,
                title,
                kind,
                accent: true,
                data,
            },
            other => other,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            ChartJob::Counts { file_name, .. } | ChartJob::Heatmap { file_name, .. } => file_name,
        }
    }
}

/// Renders chart jobs to PNG files of a fixed size.
pub struct StaticChartRenderer {
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render every job in parallel. Results keep the job order.
    pub fn render_all(
        &self,
        jobs: &[ChartJob],
        out_dir: &Path,
    ) -> Vec<(String, Result<PathBuf, RenderError>)> {
        jobs.par_iter()
            .map(|job| (job.file_name().to_string(), self.render(job, out_dir)))
            .collect()
    }

    pub fn render(&self, job: &ChartJob, out_dir: &Path) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(out_dir).map_err(|source| RenderError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;
        let path = out_dir.join(job.file_name());

        let drawn = match job {
            ChartJob::Counts {
                title,
                kind,
                accent,
                data,
                ..
            } => {
                if data.is_empty() {
                    return Err(RenderError::Empty(title.clone()));
                }
                let color = if *accent { ACCENT_COLOR } else { BAR_COLOR };
                match kind {
                    ChartKind::Line => self.draw_line(&path, title, data),
                    ChartKind::Bar => self.draw_bars(&path, title, data, color),
                    ChartKind::HorizontalBar => self.draw_horizontal_bars(&path, title, data, color),
                }
            }
            ChartJob::Heatmap { title, data, .. } => {
                if data.months.is_empty() || data.regions.is_empty() {
                    return Err(RenderError::Empty(title.clone()));
                }
                self.draw_heatmap(&path, title, data)
            }
        };

        drawn.map_err(|e| RenderError::Draw(e.to_string()))?;
        Ok(path)
    }

    fn draw_line(
        &self,
        path: &Path,
        title: &str,
        data: &CountTable,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let labels: Vec<&str> = data.rows.iter().map(|r| r.key.as_str()).collect();
        let n = labels.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..axis_max(data.max_count()))?;

        chart
            .configure_mesh()
            .x_labels(n.min(MAX_AXIS_LABELS))
            .x_label_formatter(&|v| index_label(&labels, *v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc(data.key_label.as_str())
            .y_desc(data.count_label.as_str())
            .draw()?;

        let points: Vec<(f64, f64)> = data
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64, r.count as f64))
            .collect();
        chart.draw_series(LineSeries::new(
            points.iter().copied(),
            LINE_COLOR.stroke_width(2),
        ))?;
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 3, LINE_COLOR.filled())),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_bars(
        &self,
        path: &Path,
        title: &str,
        data: &CountTable,
        color: RGBColor,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let labels: Vec<&str> = data.rows.iter().map(|r| r.key.as_str()).collect();
        let n = labels.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..axis_max(data.max_count()))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.min(MAX_AXIS_LABELS * 2))
            .x_label_formatter(&|v| index_label(&labels, *v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc(data.key_label.as_str())
            .y_desc(data.count_label.as_str())
            .draw()?;

        chart.draw_series(data.rows.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, r.count as f64)], color.filled())
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_horizontal_bars(
        &self,
        path: &Path,
        title: &str,
        data: &CountTable,
        color: RGBColor,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        // Rows arrive largest first; put the largest at the top
        let labels: Vec<&str> = data.rows.iter().rev().map(|r| r.key.as_str()).collect();
        let n = labels.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(260)
            .build_cartesian_2d(0f64..axis_max(data.max_count()), -0.5f64..(n as f64 - 0.5))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|v| index_label(&labels, *v))
            .x_label_formatter(&|v| format!("{:.0}", v))
            .x_desc(data.count_label.as_str())
            .draw()?;

        chart.draw_series(data.rows.iter().rev().enumerate().map(|(i, r)| {
            let y = i as f64;
            Rectangle::new([(0.0, y - 0.4), (r.count as f64, y + 0.4)], color.filled())
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_heatmap(
        &self,
        path: &Path,
        title: &str,
        data: &CrossTab,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let cols = data.regions.len();
        let rows = data.months.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..(cols as f64 - 0.5), -0.5f64..(rows as f64 - 0.5))?;

        let regions: Vec<&str> = data.regions.iter().map(String::as_str).collect();
        let months: Vec<&str> = data.months.iter().map(String::as_str).collect();
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(cols)
            .y_labels(rows.min(MAX_AXIS_LABELS * 2))
            .x_label_formatter(&|v| index_label(&regions, *v))
            .y_label_formatter(&|v| index_label(&months, *v))
            .label_style(("sans-serif", 11))
            .draw()?;

        let max = data.max_count();
        chart.draw_series(data.counts.iter().enumerate().flat_map(|(i, row)| {
            row.iter().enumerate().map(move |(j, &count)| {
                let (x, y) = (j as f64, i as f64);
                Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    heat_color(count, max).filled(),
                )
            })
        }))?;

        root.present()?;
        Ok(())
    }
}

/// Upper bound of the count axis: 10% headroom, never zero.
pub fn axis_max(max_count: u64) -> f64 {
    (max_count as f64 * 1.1).max(1.0)
}

/// Label for a categorical tick; blank between categories or out of range.
pub fn index_label(labels: &[&str], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels
        .get(rounded as usize)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Linear blend from the low to the high heat color.
pub fn heat_color(count: u64, max: u64) -> RGBColor {
    let t = if max == 0 {
        0.0
    } else {
        count as f64 / max as f64
    };
    let mix = |lo: u8, hi: u8| (lo as f64 + (hi as f64 - lo as f64) * t).round() as u8;
    RGBColor(
        mix(HEAT_LOW.0, HEAT_HIGH.0),
        mix(HEAT_LOW.1, HEAT_HIGH.1),
        mix(HEAT_LOW.2, HEAT_HIGH.2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CountRow;
    use pretty_assertions::assert_eq;

    #[test]
    fn axis_has_headroom() {
        assert_eq!(axis_max(0), 1.0);
        assert!((axis_max(100) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn labels_only_on_whole_indices() {
        let labels = ["2020-01", "2020-02"];
        assert_eq!(index_label(&labels, 0.0), "2020-01");
        assert_eq!(index_label(&labels, 1.0000000001), "2020-02");
        assert_eq!(index_label(&labels, 0.5), "");
        assert_eq!(index_label(&labels, 2.0), "");
        assert_eq!(index_label(&labels, -1.0), "");
    }

    #[test]
    fn heat_color_spans_the_ramp() {
        let low = heat_color(0, 10);
        let high = heat_color(10, 10);
        assert_eq!((low.0, low.1, low.2), HEAT_LOW);
        assert_eq!((high.0, high.1, high.2), HEAT_HIGH);
        let empty = heat_color(0, 0);
        assert_eq!((empty.0, empty.1, empty.2), HEAT_LOW);
    }

    #[test]
    fn empty_tables_are_not_drawn() {
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = StaticChartRenderer::new(400, 300);
        let job = ChartJob::counts(
            "empty.png",
            "Nothing",
            ChartKind::Bar,
            CountTable::new("Hour", Vec::new()),
        );

        let err = renderer.render(&job, dir.path()).unwrap_err();
        assert!(matches!(err, RenderError::Empty(t) if t == "Nothing"));
        assert!(!dir.path().join("empty.png").exists());
    }

    #[test]
    fn renders_every_kind_in_parallel() {
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = StaticChartRenderer::new(600, 400);
        let counts = CountTable::new(
            "Crime Type",
            vec![
                CountRow {
                    key: "THEFT".to_string(),
                    count: 5,
                },
                CountRow {
                    key: "ASSAULT".to_string(),
                    count: 2,
                },
            ],
        );
        let jobs = vec![
            ChartJob::counts("line.png", "Line", ChartKind::Line, counts.clone()),
            ChartJob::counts("bar.png", "Bar", ChartKind::Bar, counts.clone()).accented(),
            ChartJob::counts("hbar.png", "Ranked", ChartKind::HorizontalBar, counts),
            ChartJob::Heatmap {
                file_name: "heat.png".to_string(),
                title: "Heat".to_string(),
                data: CrossTab {
                    months: vec!["2020-01".to_string(), "2020-02".to_string()],
                    regions: vec!["Hollywood".to_string(), "Rampart".to_string()],
                    counts: vec![vec![2, 0], vec![0, 1]],
                },
            },
        ];

        let results = renderer.render_all(&jobs, dir.path());
        let names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["line.png", "bar.png", "hbar.png", "heat.png"]);
        for (name, result) in results {
            let path = result.unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(path, dir.path().join(&name));
            assert!(std::fs::metadata(&path).unwrap().len() > 0, "{name} is empty");
        }
    }
}
