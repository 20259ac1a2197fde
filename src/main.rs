use anyhow::{anyhow, bail, Result};
use crossterm::style::Stylize;
use std::path::PathBuf;
use std::sync::Arc;
use table_filter::config::config::Config;
use table_filter::data::data_view::DataView;
use table_filter::data::datatable_loaders::load_file;
use table_filter::export::html_report::write_html_report;
use table_filter::export::table_display::{export_view_to_csv, print_view};
use table_filter::filter::{initialize_tables, ColumnFilterController};
use table_filter::ui::filter_app::run_filter_app;
use table_filter::utils::app_paths::AppPaths;
use table_filter::utils::logging::init_tracing;
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    files: Vec<PathBuf>,
    filters: Vec<(String, String)>,
    config_path: Option<PathBuf>,
    print: bool,
    html_out: Option<PathBuf>,
    csv_out: Option<PathBuf>,
    init_config: bool,
    help: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut cli = CliArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let mut value_for = |flag: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| anyhow!("{} needs a value", flag))
            };
            match arg.as_str() {
                "--help" | "-h" => cli.help = true,
                "--init-config" => cli.init_config = true,
                "--print" => cli.print = true,
                "--config" => cli.config_path = Some(PathBuf::from(value_for("--config")?)),
                "--html" => cli.html_out = Some(PathBuf::from(value_for("--html")?)),
                "--export-csv" => cli.csv_out = Some(PathBuf::from(value_for("--export-csv")?)),
                "--filter" => {
                    let pair = value_for("--filter")?;
                    let Some((column, value)) = pair.split_once('=') else {
                        bail!("--filter expects COLUMN=VALUE, got '{}'", pair);
                    };
                    cli.filters.push((column.to_string(), value.to_string()));
                }
                flag if flag.starts_with("--") => bail!("Unknown option '{}'", flag),
                file => cli.files.push(PathBuf::from(file)),
            }
        }

        Ok(cli)
    }
}

fn print_help() {
    println!("{}", "table-filter - Per-column value filters for tabular data".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  table-filter [OPTIONS] FILE.csv|FILE.tsv|FILE.json...");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}  - Pre-select a column filter (repeatable)", "--filter COL=VALUE".green());
    println!("  {}            - Print the filtered rows and exit", "--print".green());
    println!("  {}         - Write an HTML report with filter dropdowns", "--html OUT".green());
    println!("  {}   - Write the filtered rows as CSV", "--export-csv OUT".green());
    println!("  {}      - Use a config file other than the default", "--config PATH".green());
    println!("  {}      - Write a commented default config file", "--init-config".green());
    println!();
    println!("{}", "Keys:".yellow());
    println!("  {}     - Select column / row", "←/→ ↑/↓".green());
    println!("  {}     - Open the filter dropdown", "Enter, f".green());
    println!("  {}            - Clear the column filter", "c".green());
    println!("  {}            - Clear all filters", "C".green());
    println!("  {}  - Switch table", "Tab/Shift+Tab".green());
    println!("  {}           - Toggle the log panel", "F5".green());
    println!("  {}        - Quit", "q, Esc".green());
    println!();
}

fn init_config_file() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::create_default_with_comments())?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

fn load_views(cli: &CliArgs, config: &Config) -> Result<Vec<DataView>> {
    cli.files
        .iter()
        .map(|path| {
            let table = load_file(path, &config.loading)?;
            info!(
                "Loaded '{}' with {} rows and {} columns",
                table.name,
                table.row_count(),
                table.column_count()
            );
            Ok(DataView::new(Arc::new(table)))
        })
        .collect()
}

/// Apply `--filter` selections to every table that has the column
fn apply_cli_filters(
    cli: &CliArgs,
    views: &mut [DataView],
    controllers: &mut [ColumnFilterController],
) -> Result<()> {
    for (column, value) in &cli.filters {
        let mut applied = false;
        for (view, controller) in views.iter_mut().zip(controllers.iter_mut()) {
            if view.column_index(column).is_some() {
                controller.select_by_header(view, column, value)?;
                applied = true;
            }
        }
        if !applied {
            bail!("No loaded table has a column named '{}'", column);
        }
    }
    Ok(())
}

fn run(cli: CliArgs) -> Result<()> {
    let logging = init_tracing(AppPaths::log_dir().ok().as_deref());
    if let Some(path) = &logging.log_path {
        info!("Logging to {}", path.display());
    }

    let config = match &cli.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Using default config: {}", e);
            Config::default()
        }),
    };

    if cli.files.is_empty() {
        bail!("No input files given (see --help)");
    }

    let mut views = load_views(&cli, &config)?;
    let mut controllers = initialize_tables(&mut views, &config.display.blank_option_label);
    apply_cli_filters(&cli, &mut views, &mut controllers)?;

    let batch = cli.print || cli.html_out.is_some() || cli.csv_out.is_some();

    if cli.print {
        for view in &views {
            println!("{}", view.name().bold());
            print_view(view);
        }
    }

    if let Some(out) = &cli.html_out {
        let names: Vec<String> = views.iter().map(|v| v.name().to_string()).collect();
        write_html_report(out, &views, &controllers, &names, &config.html)?;
        println!("HTML report written to {}", out.display());
    }

    if let Some(out) = &cli.csv_out {
        if views.len() > 1 {
            warn!("--export-csv writes only the first table");
        }
        if let Some(view) = views.first() {
            let count = export_view_to_csv(view, out)?;
            println!("{}", format!("{} rows exported to {}", count, out.display()).green());
        }
    }

    if batch {
        return Ok(());
    }

    run_filter_app(views, controllers, config.display, Some(logging.buffer))
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cli = match CliArgs::parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            std::process::exit(2);
        }
    };

    if cli.help {
        print_help();
        return;
    }

    if cli.init_config {
        if let Err(e) = init_config_file() {
            eprintln!("Error writing config file: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_filter::data::data_provider::{DataProvider, FilterableView};
    use table_filter::data::datatable::{DataColumn, DataRow, DataTable, DataValue};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options_and_files() {
        let cli = CliArgs::parse(&args(&[
            "otus.csv",
            "--filter",
            "phylum=Firmicutes",
            "--filter",
            "note=a=b",
            "--html",
            "report.html",
            "meta.json",
        ]))
        .unwrap();

        assert_eq!(cli.files, vec![PathBuf::from("otus.csv"), PathBuf::from("meta.json")]);
        assert_eq!(
            cli.filters,
            vec![
                ("phylum".to_string(), "Firmicutes".to_string()),
                ("note".to_string(), "a=b".to_string())
            ]
        );
        assert_eq!(cli.html_out, Some(PathBuf::from("report.html")));
        assert!(!cli.print);
    }

    #[test]
    fn test_parse_errors() {
        assert!(CliArgs::parse(&args(&["--filter"])).is_err());
        assert!(CliArgs::parse(&args(&["--filter", "nocolumn"])).is_err());
        assert!(CliArgs::parse(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_empty_filter_value_clears() {
        let cli = CliArgs::parse(&args(&["--filter", "phylum="])).unwrap();
        assert_eq!(cli.filters, vec![("phylum".to_string(), String::new())]);
    }

    fn create_view(name: &str, columns: &[&str], rows: &[&[&str]]) -> DataView {
        let mut table = DataTable::new(name);
        for column in columns {
            table.add_column(DataColumn::new(*column));
        }
        for row in rows {
            let values = row
                .iter()
                .map(|v| DataValue::String(v.to_string()))
                .collect();
            table.add_row(DataRow::new(values)).unwrap();
        }
        DataView::new(Arc::new(table))
    }

    fn create_views() -> Vec<DataView> {
        vec![
            create_view(
                "otus",
                &["otu", "phylum"],
                &[&["Otu1", "Firmicutes"], &["Otu2", "Bacteroidetes"]],
            ),
            create_view("samples", &["sample", "site"], &[&["S1", "gut"], &["S2", "skin"]]),
        ]
    }

    #[test]
    fn test_cli_filter_applies_only_where_column_exists() {
        let mut views = create_views();
        let mut controllers = initialize_tables(&mut views, "");
        let cli = CliArgs::parse(&args(&["--filter", "phylum=Firmicutes"])).unwrap();

        apply_cli_filters(&cli, &mut views, &mut controllers).unwrap();

        assert_eq!(views[0].get_row_count(), 1);
        assert_eq!(views[0].get_cell_value(0, 0), Some("Otu1".to_string()));
        assert_eq!(controllers[0].control(1).unwrap().selected_value(), "Firmicutes");
        assert_eq!(views[1].get_row_count(), 2);
        assert!(views[1].filters().is_empty());
    }

    #[test]
    fn test_cli_filter_on_shared_column_hits_every_table() {
        let mut views = vec![
            create_view("a", &["sample"], &[&["S1"], &["S2"]]),
            create_view("b", &["sample"], &[&["S2"], &["S3"], &["S2"]]),
        ];
        let mut controllers = initialize_tables(&mut views, "");
        let cli = CliArgs::parse(&args(&["--filter", "sample=S2"])).unwrap();

        apply_cli_filters(&cli, &mut views, &mut controllers).unwrap();

        assert_eq!(views[0].get_row_count(), 1);
        assert_eq!(views[1].get_row_count(), 2);
    }

    #[test]
    fn test_cli_filter_on_unknown_column_fails() {
        let mut views = create_views();
        let mut controllers = initialize_tables(&mut views, "");
        let cli = CliArgs::parse(&args(&["--filter", "kingdom=Bacteria"])).unwrap();

        let err = apply_cli_filters(&cli, &mut views, &mut controllers).unwrap_err();
        assert!(err.to_string().contains("kingdom"));
        assert!(views.iter().all(|v| v.get_row_count() == v.total_row_count()));
    }
}
