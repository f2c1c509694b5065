use serde::{Deserialize, Serialize};

/// A consent-gated script that has been activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadedScript {
    /// The element's `id` attribute, or a generated `script-<n>`.
    pub id: String,
    /// Category that unlocked the script.
    pub category: String,
    /// Service named by `data-consent-service`, if any.
    #[serde(default)]
    pub service: Option<String>,
    /// Source URL, `None` for inline scripts.
    #[serde(default)]
    pub src: Option<String>,
}

/// Payload of the "script loaded" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScriptLoadedArgs {
    pub script: LoadedScript,
    pub all_loaded_scripts: Vec<LoadedScript>,
}
