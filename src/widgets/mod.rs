pub mod filter_dropdown_widget;
