use crate::output::print_json;
use std::path::Path;
use vibecraft_core::phase;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(root)?;
    let next = phase::next_phase(&manifest);

    if json {
        print_json(&serde_json::json!({ "next_phase": next }))?;
    } else {
        println!("{next}");
    }
    Ok(())
}
