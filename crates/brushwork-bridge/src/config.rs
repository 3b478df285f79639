pub const DEFAULT_INSTANCE_NAME: &str = "m";
pub const DEFAULT_MAX_BINS: usize = 20;

/// Bridge settings.
///
/// `from_env` reads:
/// - `BRUSHWORK_INSTANCE_NAME`: name the client uses to address the engine from generated code
/// - `BRUSHWORK_MAX_BINS`: bucket budget for distribution queries
/// - `BRUSHWORK_EXECUTE_CELLS`: whether generated cells are executed right away
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    pub instance_name: String,
    pub max_bins: usize,
    pub execute_generated_cells: bool,
    /// Prefix generated cells with an `# auto-created on ...` comment.
    pub annotate_generated_cells: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            max_bins: DEFAULT_MAX_BINS,
            execute_generated_cells: true,
            annotate_generated_cells: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup("BRUSHWORK_INSTANCE_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            config.instance_name = name;
        }
        if let Some(bins) = lookup("BRUSHWORK_MAX_BINS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
        {
            config.max_bins = bins;
        }
        if let Some(value) = lookup("BRUSHWORK_EXECUTE_CELLS") {
            config.execute_generated_cells =
                matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        assert_eq!(BridgeConfig::from_lookup(lookup(&[])), BridgeConfig::default());
    }

    #[test]
    fn env_overrides_and_invalid_values() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("BRUSHWORK_INSTANCE_NAME", " bw "),
            ("BRUSHWORK_MAX_BINS", "0"),
            ("BRUSHWORK_EXECUTE_CELLS", "no"),
        ]));
        assert_eq!(config.instance_name, "bw");
        assert_eq!(config.max_bins, DEFAULT_MAX_BINS);
        assert!(!config.execute_generated_cells);

        let config = BridgeConfig::from_lookup(lookup(&[("BRUSHWORK_MAX_BINS", "8")]));
        assert_eq!(config.max_bins, 8);
    }
}
