//! Pipeline run summary

use std::collections::BTreeMap;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::{Serialize, Serializer};

use crate::pipeline::{ComponentVariance, FeatureScore, PipelineConfig, ScalingMethod, Stage};

/// Shape and timing of one completed stage
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub rows: usize,
    pub columns: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub target_column: String,
    pub bins: usize,
    pub n_components: usize,
    pub scaling_method: ScalingMethod,
    pub seed: u64,
    pub stages: Vec<StageRecord>,
    /// Mode of the target before balancing. Imputation runs first, so this
    /// is only `None` before the Balance stage has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub majority_label: Option<String>,
    #[serde(serialize_with = "serialize_class_counts")]
    pub class_counts_before: BTreeMap<Option<String>, usize>,
    #[serde(serialize_with = "serialize_class_counts")]
    pub class_counts_after: BTreeMap<Option<String>, usize>,
    pub discretized_columns: Vec<String>,
    pub feature_scores: Vec<FeatureScore>,
    pub components: Vec<ComponentVariance>,
    pub output_columns: Vec<String>,
}

impl PipelineSummary {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            target_column: config.target_column.clone(),
            bins: config.bins,
            n_components: config.n_components,
            scaling_method: config.scaling_method,
            seed: config.seed,
            stages: Vec::new(),
            majority_label: None,
            class_counts_before: BTreeMap::new(),
            class_counts_after: BTreeMap::new(),
            discretized_columns: Vec::new(),
            feature_scores: Vec::new(),
            components: Vec::new(),
            output_columns: Vec::new(),
        }
    }

    pub fn record(&mut self, record: StageRecord) {
        self.stages.push(record);
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn total_elapsed(&self) -> Duration {
        self.stages.iter().map(|r| r.elapsed).sum()
    }

    pub fn selected_features(&self) -> Vec<&str> {
        self.feature_scores
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.feature.as_str())
            .collect()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("PIPELINE SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Rows").add_attribute(Attribute::Bold),
            Cell::new("Columns").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
        ]);
        for record in &self.stages {
            table.add_row(vec![
                Cell::new(record.stage.title()),
                Cell::new(record.rows),
                Cell::new(record.columns),
                Cell::new(format_duration(record.elapsed)),
            ]);
        }
        table.add_row(vec![
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format_duration(self.total_elapsed()))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        print_indented(&table);

        if !self.class_counts_before.is_empty() {
            println!();
            println!(
                "      {} {}",
                style("Class balance").yellow(),
                style(format!(
                    "(majority: {})",
                    self.majority_label.as_deref().unwrap_or("-")
                ))
                .dim()
            );
            for (label, before) in &self.class_counts_before {
                let after = self.class_counts_after.get(label).copied().unwrap_or(0);
                println!(
                    "        {} {}: {} → {}",
                    style("•").dim(),
                    match label {
                        Some(text) => style(text.clone()),
                        None => style("(missing)".to_string()).italic(),
                    },
                    before,
                    style(after).green()
                );
            }
        }

        if !self.feature_scores.is_empty() {
            println!();
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_header(vec![
                Cell::new("Feature").add_attribute(Attribute::Bold),
                Cell::new("F score").add_attribute(Attribute::Bold),
                Cell::new("Selected").add_attribute(Attribute::Bold),
            ]);
            for score in &self.feature_scores {
                table.add_row(vec![
                    Cell::new(&score.feature),
                    Cell::new(format_score(score.f_score)),
                    if score.selected {
                        Cell::new("yes").fg(Color::Green)
                    } else {
                        Cell::new("no").fg(Color::Red)
                    },
                ]);
            }
            print_indented(&table);
        }

        if !self.components.is_empty() {
            println!();
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_header(vec![
                Cell::new("Component").add_attribute(Attribute::Bold),
                Cell::new("Variance").add_attribute(Attribute::Bold),
                Cell::new("Explained").add_attribute(Attribute::Bold),
            ]);
            for component in &self.components {
                table.add_row(vec![
                    Cell::new(&component.component),
                    Cell::new(format!("{:.4}", component.explained_variance)),
                    Cell::new(format!("{:.1}%", component.explained_variance_ratio * 100.0))
                        .fg(Color::Cyan),
                ]);
            }
            print_indented(&table);
        }
    }
}

/// Class counts as a list of `{label, rows}` so a missing label stays `null`.
fn serialize_class_counts<S: Serializer>(
    counts: &BTreeMap<Option<String>, usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct ClassCount<'a> {
        label: Option<&'a str>,
        rows: usize,
    }

    serializer.collect_seq(counts.iter().map(|(label, &rows)| ClassCount {
        label: label.as_deref(),
        rows,
    }))
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn format_score(score: f64) -> String {
    if score.is_nan() {
        "n/a".to_string()
    } else if score.is_infinite() {
        "∞".to_string()
    } else {
        format!("{:.3}", score)
    }
}

fn format_duration(elapsed: Duration) -> String {
    let ms = elapsed.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{:.1} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64() * 1000.0)
}
