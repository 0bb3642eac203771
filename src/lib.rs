pub mod cli;
pub mod config;
pub mod dashboard;
pub mod inbox;
pub mod labels;
pub mod logging {
    pub mod ndjson;
}
pub mod records;
pub mod service;
pub mod submit;
