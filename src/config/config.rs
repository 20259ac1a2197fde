use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub html: HtmlConfig,
    pub loading: LoadingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Label of the option that clears a column filter
    pub blank_option_label: String,

    /// Show row numbers in the results table
    pub show_row_numbers: bool,

    /// Widest a column may render in the terminal
    pub max_column_width: u16,

    /// Text shown for empty cells in the terminal
    pub null_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// CSS class set on every report table; the init script finds tables by id
    pub table_class: String,

    pub datatables_css: String,
    pub datatables_js: String,
    pub jquery_js: String,

    /// Page sizes offered by the widget; -1 means all rows
    pub length_menu: Vec<i64>,

    /// Horizontal scrolling for wide tables
    pub scroll_x: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    /// Field delimiter; guessed from the file extension when unset
    pub delimiter: Option<char>,

    /// Parse numbers and booleans instead of keeping every cell as text
    pub infer_types: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            blank_option_label: String::new(),
            show_row_numbers: false,
            max_column_width: 40,
            null_display: "∅".to_string(),
        }
    }
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            table_class: "dataframe".to_string(),
            datatables_css: "https://cdn.datatables.net/1.10.12/css/jquery.dataTables.min.css"
                .to_string(),
            datatables_js: "https://cdn.datatables.net/1.10.12/js/jquery.dataTables.min.js"
                .to_string(),
            jquery_js: "https://ajax.googleapis.com/ajax/libs/jquery/1.12.4/jquery.min.js"
                .to_string(),
            length_menu: vec![10, 25, 50, 100, 200, -1],
            scroll_x: true,
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            infer_types: true,
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("table-filter").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# table-filter Configuration File
# Location: ~/.config/table-filter/config.toml (Linux)
#           ~/Library/Application Support/table-filter/config.toml (macOS)
#           %APPDATA%\table-filter\config.toml (Windows)

[display]
# Label of the dropdown entry that removes a column filter
blank_option_label = ""

# Show row numbers in the results table
show_row_numbers = false

# Maximum rendered column width in the terminal
max_column_width = 40

# Text shown for empty cells in the terminal
null_display = "∅"

[html]
# CSS class set on every table in HTML reports (for styling)
table_class = "dataframe"

datatables_css = "https://cdn.datatables.net/1.10.12/css/jquery.dataTables.min.css"
datatables_js = "https://cdn.datatables.net/1.10.12/js/jquery.dataTables.min.js"
jquery_js = "https://ajax.googleapis.com/ajax/libs/jquery/1.12.4/jquery.min.js"

# Page sizes; -1 shows all rows
length_menu = [10, 25, 50, 100, 200, -1]

scroll_x = true

[loading]
# Field delimiter, guessed from the extension when commented out (.tsv -> tab)
# delimiter = ";"

# Parse numbers and booleans; display text is kept either way
infer_types = true
"#
        .to_string()
    }
}
