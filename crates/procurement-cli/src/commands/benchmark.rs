//! Benchmark command

use crate::app::{BenchmarkArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use procurement_core::{BenchmarkRequest, Services};

/// Build and validate the request from command-line arguments
pub fn request(args: &BenchmarkArgs) -> Result<BenchmarkRequest> {
    let request = BenchmarkRequest {
        product: args.product.join(" "),
        quote: args.quote,
        quantity: args.quantity,
        location: args.location.clone(),
    };
    request.validate()?;
    Ok(request)
}

pub async fn run(request: BenchmarkRequest, services: &Services, format: OutputFormat) -> Result<()> {
    let result = services.benchmark(&request).await?;
    print!("{}", output::format_benchmark(&request, &result, format));
    Ok(())
}
