pub mod filter_app;
