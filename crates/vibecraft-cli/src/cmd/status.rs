use crate::output::{print_json, print_table};
use std::path::Path;
use vibecraft_core::phase::{self, PhaseStatus};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(root)?;
    let statuses = phase::phase_statuses(&manifest);
    let (sub_done, sub_total) = phase::implement_progress(&manifest);
    let next = phase::next_phase(&manifest);

    if json {
        let phases: Vec<_> = statuses
            .iter()
            .map(|(name, status)| serde_json::json!({ "name": name, "status": status }))
            .collect();
        return print_json(&serde_json::json!({
            "project_name": manifest.project_name,
            "project_type": manifest.project_type,
            "mode": manifest.mode,
            "version": manifest.version,
            "current_phase": next,
            "phases": phases,
            "phases_completed": manifest.phases_completed,
            "implement": {
                "completed": sub_done,
                "total": sub_total,
            },
        }));
    }

    println!("Project: {}", manifest.project_name);
    if !manifest.project_type.is_empty() {
        println!("Type:    {}", manifest.project_type.join(", "));
    }
    println!("Mode:    {}", manifest.mode);
    println!("Phase:   {next}\n");

    let rows: Vec<Vec<String>> = statuses
        .iter()
        .map(|(name, status)| {
            let hint = match status {
                PhaseStatus::Current if name == "implement" => {
                    format!("vibecraft complete {}", sub_done + 1)
                }
                PhaseStatus::Current => format!("vibecraft complete-skill {name}_skill"),
                _ => String::new(),
            };
            vec![name.clone(), status.to_string(), hint]
        })
        .collect();
    print_table(&["PHASE", "STATUS", "NEXT"], rows);

    match sub_total {
        Some(total) if total > 0 => println!("\nImplement: {sub_done}/{total} sub-phases"),
        _ if sub_done > 0 => println!("\nImplement: {sub_done} sub-phases (total not set)"),
        _ => {}
    }
    Ok(())
}
