//! Selection summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{Selection, SelectionModel, SolveStatus};

/// Summary of one selection run
#[derive(Debug, Clone)]
pub struct SelectionSummary {
    pub records: usize,
    pub households: usize,
    pub eligible_households: usize,
    pub vip_cap: usize,
    pub vip_count: usize,
    pub status: SolveStatus,
    pub objective_value: f64,
    pub baseline_value: f64,
}

impl SelectionSummary {
    pub fn new(records: usize, model: &SelectionModel, selection: &Selection) -> Self {
        Self {
            records,
            households: model.households().len(),
            eligible_households: model.eligible_count(),
            vip_cap: model.vip_cap(),
            vip_count: selection.vip_count(),
            status: selection.status,
            objective_value: selection.objective_value,
            baseline_value: selection.baseline_value,
        }
    }

    /// Households barred from VIP by the perk-value filter
    pub fn excluded_households(&self) -> usize {
        self.households - self.eligible_households
    }

    pub fn lift(&self) -> f64 {
        self.objective_value - self.baseline_value
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("SELECTION SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Records"), Cell::new(self.records)]);
        table.add_row(vec![Cell::new("🏠 Households"), Cell::new(self.households)]);
        table.add_row(vec![
            Cell::new("🚫 Excluded (Low Perk)"),
            Cell::new(self.excluded_households()).fg(if self.excluded_households() == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![Cell::new("🎯 VIP Cap"), Cell::new(self.vip_cap)]);
        table.add_row(vec![
            Cell::new("⭐ VIPs Selected"),
            Cell::new(self.vip_count)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("🧮 Solver Status"),
            Cell::new(self.status).fg(if self.status == SolveStatus::Optimal {
                Color::Green
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("💰 Projected Margin"),
            Cell::new(format!("{:.2}", self.objective_value)),
        ]);
        table.add_row(vec![
            Cell::new("📉 Margin (No VIPs)"),
            Cell::new(format!("{:.2}", self.baseline_value)),
        ]);

        let lift = self.lift();
        let color = if lift > 0.0 { Color::Green } else { Color::Cyan };
        table.add_row(vec![
            Cell::new("📈 Lift"),
            Cell::new(format!("{:+.2}", lift))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}
