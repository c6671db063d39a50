#![allow(async_fn_in_trait)]
pub mod asf;
pub mod catalog;
pub mod config;
pub mod date_range;
pub mod download_plan;
pub mod error;
pub mod netrc;
pub mod pair_selection;
pub mod scene;
