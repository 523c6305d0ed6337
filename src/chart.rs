//! Interactive terminal bar charts.
//!
//! Charts are drawn with Plotters primitives into a Ratatui frame via
//! `plotters-ratatui-backend`, so nothing is written to disk. [`show`] takes
//! over the terminal (alternate screen, raw mode), draws the chart, and
//! blocks until the user dismisses it.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Widget},
    Terminal,
};

use std::io;

use crate::report::TitleBreakdown;

/// High-contrast fill colors for stacked layers, reused cyclically.
const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(23, 190, 207),
];

/// One layer of bars: a label and one count per chart date.
#[derive(Debug)]
pub struct Layer {
    pub label: String,
    pub counts: Vec<u64>,
}

/// A bar chart over a common set of dates.
///
/// A single layer renders as a plain bar chart; several layers render
/// stacked, first layer at the bottom, with a legend.
#[derive(Debug)]
pub struct BarChart {
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub layers: Vec<Layer>,
}

impl BarChart {
    /// Builds a single-layer chart of total sales per date.
    #[must_use]
    pub fn daily_totals(totals: &[(NaiveDate, u64)]) -> Self {
        Self {
            title: "Daily sales, all books".to_string(),
            dates: totals.iter().map(|&(date, _)| date).collect(),
            layers: vec![Layer {
                label: "All books".to_string(),
                counts: totals.iter().map(|&(_, count)| count).collect(),
            }],
        }
    }

    /// Builds a stacked chart from a per-book breakdown, one layer per book
    /// in breakdown order.
    #[must_use]
    pub fn stacked(breakdown: &TitleBreakdown) -> Self {
        Self {
            title: "Daily sales per book".to_string(),
            dates: breakdown.dates.clone(),
            layers: breakdown
                .series
                .iter()
                .map(|series| Layer {
                    label: series.title.clone(),
                    counts: series.counts.clone(),
                })
                .collect(),
        }
    }
}

/// Returns the stacking offset for each layer: the offset of layer `i` at
/// date index `j` is the sum of layers `0..i`'s counts at `j`, so the first
/// layer sits on zero and every later layer sits on top of all the ones
/// before it.
fn baselines(layers: &[Layer]) -> Vec<Vec<u64>> {
    let len = layers.first().map_or(0, |layer| layer.counts.len());
    let mut offsets = Vec::with_capacity(layers.len());
    let mut running = vec![0; len];
    for layer in layers {
        offsets.push(running.clone());
        for (total, &count) in running.iter_mut().zip(&layer.counts) {
            *total += count;
        }
    }
    offsets
}

/// Displays `chart` in the terminal, blocking until it is dismissed with
/// `q`, `Esc`, or `Enter`.
///
/// # Errors
///
/// Returns any errors from setting up or drawing to the terminal. The
/// terminal is restored on every exit path.
pub fn show(chart: &BarChart) -> Result<()> {
    debug!(
        "showing chart {:?}: {} dates, {} layers",
        chart.title,
        chart.dates.len(),
        chart.layers.len()
    );
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
    loop {
        terminal
            .draw(|frame| draw(chart, frame))
            .context("terminal draw error")?;

        match event::read().context("terminal event error")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => break,
                _ => {}
            },
            _ => {}
        }
    }
    Ok(())
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e).context("failed to enter alternate screen");
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

fn draw(chart: &BarChart, frame: &mut ratatui::Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let block = Block::default()
        .title(chart.title.clone())
        .borders(Borders::ALL);
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    if chart.dates.is_empty() {
        let notice = Paragraph::new("No sales records to chart.")
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(notice, inner);
    } else {
        frame.render_widget(BarChartWidget { chart }, inner);
    }

    let hint = Paragraph::new("q to close").style(Style::default().fg(Color::Gray));
    frame.render_widget(hint, chunks[1]);
}

/// Renders the bars of a [`BarChart`] with Plotters.
struct BarChartWidget<'a> {
    chart: &'a BarChart,
}

impl Widget for BarChartWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters can fail to lay out a chart in a tiny area; hint instead
        // of panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let dates = &self.chart.dates;
        let layers = &self.chart.layers;
        let n = dates.len();
        let offsets = baselines(layers);

        // Top of the y axis: the tallest stacked column, with headroom.
        let tallest = (0..n)
            .map(|i| layers.iter().map(|layer| layer.counts[i]).sum::<u64>())
            .max()
            .unwrap_or(0);
        let y_max = (tallest.max(1) as f64) * 1.05;
        let with_legend = layers.len() > 1;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(0f64..n as f64, 0f64..y_max)?;

            // Terminal cells are low-res; bare axes with a handful of tick
            // labels read better than a full mesh.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc("sales")
                .x_labels(n.min(8))
                .y_labels(5)
                .x_label_formatter(&|x| {
                    let idx = *x as usize;
                    if idx < dates.len() {
                        dates[idx].format("%m-%d").to_string()
                    } else {
                        String::new()
                    }
                })
                .y_label_formatter(&|y| format!("{y:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            for (index, layer) in layers.iter().enumerate() {
                let color = PALETTE[index % PALETTE.len()];
                let offset = &offsets[index];
                let bars: Vec<Rectangle<(f64, f64)>> = layer
                    .counts
                    .iter()
                    .enumerate()
                    .filter(|&(_, &count)| count > 0)
                    .map(|(i, &count)| {
                        Rectangle::new(
                            [
                                (i as f64 + 0.1, offset[i] as f64),
                                (i as f64 + 0.9, (offset[i] + count) as f64),
                            ],
                            color.filled(),
                        )
                    })
                    .collect();
                let annotation = chart.draw_series(bars)?;
                if with_legend {
                    annotation.label(layer.label.clone()).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 3), (x + 7, y + 3)], color.filled())
                    });
                }
            }

            if with_legend {
                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperRight)
                    .background_style(BLACK.mix(0.8))
                    .border_style(&WHITE)
                    .label_font(("sans-serif", 10).into_font().color(&WHITE))
                    .draw()?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
