//! CLI command handlers

pub mod analyze;
pub mod benchmark;

use crate::app::OutputFormat;
use anyhow::Result;
use procurement_core::{BenchmarkRequest, Query, Services};

/// A validated request ready to run
pub enum Request {
    Analyze(Query),
    Benchmark(BenchmarkRequest),
}

pub async fn execute(request: Request, services: &Services, format: OutputFormat) -> Result<()> {
    match request {
        Request::Analyze(query) => analyze::run(query, services, format).await,
        Request::Benchmark(request) => benchmark::run(request, services, format).await,
    }
}
