#[path = "../common/mod.rs"]
mod common;

mod admin;
mod ingest;
mod records;
mod summaries;
