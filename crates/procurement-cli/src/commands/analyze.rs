//! Analyze command

use crate::app::{AnalyzeArgs, OutputFormat};
use crate::output;
use anyhow::{bail, Result};
use procurement_core::{Query, Services, WorkflowStage};

/// Build and validate the query from command-line arguments
pub fn query(args: &AnalyzeArgs) -> Result<Query> {
    let mut query = Query::new(args.query.join(" ")).with_requirements(args.requirements.clone());
    if let Some(ref location) = args.location {
        query = query.with_location(location);
    }
    if let Some(ref category) = args.category {
        query = query.with_category(category);
    }
    if let Some(ref timeline) = args.timeline {
        query = query.with_timeline(timeline);
    }
    query.validate()?;
    Ok(query)
}

pub async fn run(query: Query, services: &Services, format: OutputFormat) -> Result<()> {
    let result = services.analyze(query).await;
    print!("{}", output::format_workflow(&result, format));

    if result.stage == WorkflowStage::Failed {
        bail!(result
            .error
            .unwrap_or_else(|| "analysis failed".to_string()));
    }
    Ok(())
}
