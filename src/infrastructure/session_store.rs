// Design sessions persisted as flat JSON records
use std::path::Path;

use anyhow::Context;

use crate::domain::design::DesignInputs;

pub fn save_session(path: &Path, inputs: &DesignInputs) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(inputs).context("Failed to serialize design session")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write session {}", path.display()))?;
    tracing::info!("Saved design session to {}", path.display());
    Ok(())
}

/// Missing keys take their defaults, so older session files still load.
pub fn load_session(path: &Path) -> anyhow::Result<DesignInputs> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read session {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid session file {}", path.display()))
}
