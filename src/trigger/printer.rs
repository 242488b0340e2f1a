use crate::Result;
use crate::trigger::store::TriggerStore;
use chrono::{Local, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};

/// 打印最近的运行记录
pub fn list_runs(store: &TriggerStore, limit: usize) -> Result<()> {
    let runs = store.recent_runs(limit)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Run", "Started", "Scenario", "Env", "Status", "Duration"]);

    let now = Utc::now();
    for run in runs {
        let (status, color) = match run.success {
            Some(true) => ("passed", Color::Green),
            Some(false) => ("failed", Color::Red),
            None => ("running", Color::Yellow),
        };

        table.add_row(vec![
            Cell::new(run.run_id()),
            Cell::new(run.timestamp_start.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&run.scenario_folder).add_attribute(Attribute::Dim),
            Cell::new(&run.environment),
            Cell::new(status).fg(color),
            Cell::new(format!("{}s", run.duration_seconds.unwrap_or_else(|| run.elapsed_seconds(now)))),
        ]);
    }

    println!("{}", table);

    Ok(())
}
