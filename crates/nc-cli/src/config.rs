use anyhow::Context;
use nc_editor::InteractionConfig;
use nc_store::StoreConfig;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "notecanvas.json";

/// Per-vault settings from `<vault>/notecanvas.json`. Every field is
/// optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub interaction: InteractionConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub async fn load(vault: &Path) -> anyhow::Result<Self> {
        let path = vault.join(CONFIG_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Self::parse(&text).with_context(|| format!("invalid config {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }
}
