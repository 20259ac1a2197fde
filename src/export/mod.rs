pub mod html_report;
pub mod table_display;
