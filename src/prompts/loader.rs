use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::templates::{CONTINUATION_FRAMING_DEFAULT, INITIAL_FRAMING_DEFAULT};

/// Loads framing templates from disk with fallback to the built-in defaults
pub struct PromptLoader {
    prompts_dir: Option<PathBuf>,
}

impl PromptLoader {
    pub fn new(prompts_dir: Option<impl AsRef<Path>>) -> Self {
        Self {
            prompts_dir: prompts_dir.map(|p| p.as_ref().to_path_buf()),
        }
    }

    /// Load the first-turn framing, using the default if no file exists
    pub fn load_initial(&self) -> Result<String> {
        self.load_or_default("initial.md", INITIAL_FRAMING_DEFAULT)
    }

    /// Load the later-turn framing, using the default if no file exists
    pub fn load_continuation(&self) -> Result<String> {
        self.load_or_default("continuation.md", CONTINUATION_FRAMING_DEFAULT)
    }

    fn load_or_default(&self, file: &str, default: &str) -> Result<String> {
        if let Some(dir) = &self.prompts_dir {
            let path = dir.join(file);
            if path.exists() {
                log::debug!("Loading framing template from: {:?}", path);
                return fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("Failed to read template {:?}: {}", path, e));
            }
        }

        log::debug!("Using default framing template for {}", file);
        Ok(default.to_string())
    }
}
