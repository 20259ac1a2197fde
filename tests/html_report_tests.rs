use std::io::Write;
use std::sync::Arc;
use table_filter::config::config::{Config, LoadingConfig};
use table_filter::data::data_view::DataView;
use table_filter::data::datatable_loaders::load_file;
use table_filter::export::html_report::write_html_report;
use table_filter::filter::initialize_tables;

#[test]
fn test_report_from_filtered_csv() {
    let mut csv = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(csv, "otu,taxon\nOtu1,k__Bacteria\nOtu2,k__Archaea (1)\nOtu3,k__Bacteria\n").unwrap();
    csv.flush().unwrap();

    let table = load_file(csv.path(), &LoadingConfig::default()).unwrap();
    let mut views = vec![DataView::new(Arc::new(table))];
    let mut controllers = initialize_tables(&mut views, "");
    controllers[0]
        .select_by_header(&mut views[0], "taxon", "k__Archaea (1)")
        .unwrap();

    let mut config = Config::default();
    config.html.table_class = "otu-table".to_string();
    config.html.length_menu = vec![10, -1];

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.html");
    let names = vec!["otus".to_string()];
    write_html_report(&out, &views, &controllers, &names, &config.html).unwrap();

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains(r#"class="otu-table""#));
    assert!(html.contains(r#"<option value="k__Archaea (1)" selected="selected">"#));
    assert!(html.contains(r#"<option value="k__Bacteria">"#));
    assert!(html.contains(r#""search":"^k__Archaea \\(1\\)$""#));
    assert!(html.contains(r#"lengthMenu: [[10,-1],[10,"All"]]"#));
    assert!(html.contains("escapeRegex"));
    assert_eq!(html.matches("<td>Otu").count(), 3);
}
