use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::CoexnetError;

/// Probe-to-symbol mapping collaborator. A missing symbol is not an error;
/// callers fall back to the probe id.
pub trait SymbolLookup {
    fn symbol(&self, probe_id: &str) -> Option<&str>;
}

/// Lookup with no mapping loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl SymbolLookup for NoSymbols {
    fn symbol(&self, _probe_id: &str) -> Option<&str> {
        None
    }
}

/// Two-column TSV mapping, `probe_id<TAB>symbol`. Rows with an empty symbol
/// field are treated as unmapped and skipped.
#[derive(Debug, Clone, Default)]
pub struct TsvSymbolLookup {
    map: HashMap<String, String>,
}

impl TsvSymbolLookup {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read symbol TSV {}", path.display()))?;
        let mut map = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = trimmed.split('\t').collect();
            if parts.len() != 2 {
                return Err(CoexnetError::Input(format!(
                    "{}:{} malformed symbol TSV (expected 2 columns)",
                    path.display(),
                    line_no
                ))
                .into());
            }
            let probe = parts[0].trim();
            let symbol = parts[1].trim();
            if probe.is_empty() || symbol.is_empty() {
                continue;
            }
            map.insert(probe.to_string(), symbol.to_string());
        }
        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl SymbolLookup for TsvSymbolLookup {
    fn symbol(&self, probe_id: &str) -> Option<&str> {
        self.map.get(probe_id).map(|s| s.as_str())
    }
}
