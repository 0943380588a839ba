//! Sends a fixed sample through the configured chat deployment and prints
//! what comes back. Run by hand; the server never calls this.

use anyhow::Result;
use api::AppConfig;
use extract::{Analysis, EntityAnalyzer};

const SAMPLE_TEXT: &str =
    "Jane Smith of Acme Corporation will visit Berlin on 3 May 2021. Reach her at jane@acme.example.";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    api::telemetry::init();

    let config = AppConfig::from_env()?;
    println!("=== Model check ===\n");
    println!("Endpoint:    {}", config.model.endpoint);
    println!("Deployment:  {}", config.model.deployment);
    println!("API version: {}\n", config.model.api_version);

    let analyzer = EntityAnalyzer::from_config(config.model);

    match analyzer.analyze_text(SAMPLE_TEXT).await {
        Analysis::Found(entities) => {
            println!("Model answered with {} entities:", entities.len());
            for entity in &entities {
                println!(
                    "Entity: {}, Category: {}, Confidence Score: {}",
                    entity.text, entity.category, entity.confidence_score
                );
            }
            Ok(())
        }
        Analysis::Failed(e) => anyhow::bail!("Model check failed: {e}"),
    }
}
