//! Stage — one fixed step of the pipeline.

use pipeview_config::{PipelineConfig, StageConfig};

/// An immutable stage definition. `index` is its position in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub index: usize,
    pub label: String,
    pub command: String,
}

impl Stage {
    pub fn new(index: usize, label: &str, command: &str) -> Self {
        Self {
            index,
            label: label.to_string(),
            command: command.to_string(),
        }
    }

    pub fn from_config(index: usize, def: &StageConfig) -> Self {
        Self::new(index, def.label(), def.command.trim())
    }

    /// All stages of a config, indexed in declaration order.
    pub fn all_from(config: &PipelineConfig) -> Vec<Stage> {
        config
            .stages
            .iter()
            .enumerate()
            .map(|(i, def)| Self::from_config(i, def))
            .collect()
    }

    /// Program and arguments. Plain whitespace tokenizing: no quoting,
    /// globbing or redirection.
    pub fn argv(&self) -> Vec<&str> {
        self.command.split_whitespace().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_splits_on_whitespace() {
        let stage = Stage::new(0, "count", "  uniq   -c ");
        assert_eq!(stage.argv(), ["uniq", "-c"]);
    }

    #[test]
    fn argv_of_blank_command_is_empty() {
        assert!(Stage::new(0, "nothing", "   ").argv().is_empty());
    }

    #[test]
    fn indices_follow_config_order() {
        let stages = Stage::all_from(&PipelineConfig::default());
        let idx: Vec<usize> = stages.iter().map(|s| s.index).collect();
        assert_eq!(idx, [0, 1, 2, 3]);
        assert_eq!(stages[1].command, "grep error");
        assert_eq!(stages[1].label, "Keep errors");
    }
}
