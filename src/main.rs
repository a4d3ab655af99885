use fitroom::{
    logger, BatchOrchestrator, GeminiClient, GeminiConfig, ProgressEvent, SCENARIOS,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    logger::init_with_config(
        logger::LoggerConfig::development().with_level(logger::LogLevel::Debug),
    )?;

    let mut args = env::args().skip(1);
    let (subject_path, garment_path) = match (args.next(), args.next()) {
        (Some(subject), Some(garment)) => (subject, garment),
        _ => {
            log::error!("Usage: fitroom <subject-photo> <garment-photo> [scenario-id]");
            std::process::exit(1);
        }
    };
    let scenario_id = args.next().unwrap_or_else(|| "scenario-0".to_string());

    let scenario = SCENARIOS
        .iter()
        .find(|s| s.id == scenario_id)
        .cloned()
        .unwrap_or_else(|| {
            log::warn!("Unknown scenario '{}', using the original background", scenario_id);
            SCENARIOS[0].clone()
        });

    log::info!("🔄 Creating Gemini client...");
    let client = match GeminiClient::new(GeminiConfig::from_env()) {
        Ok(client) => {
            log::info!("✅ Gemini client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {}", e);
            return Err(e.into());
        }
    };

    let subject_bytes = fs::read(&subject_path)?;
    let garment_bytes = fs::read(&garment_path)?;

    log::info!(
        "👗 Generating try-on batch for scenario '{}' ({})",
        scenario.name,
        scenario.id
    );

    let orchestrator = BatchOrchestrator::new(client.synthesis().clone());
    let observer = |event: &ProgressEvent| {
        log::info!("📣 {}", event.message());
    };

    match orchestrator
        .generate_batch(&subject_bytes, &garment_bytes, &scenario, &observer)
        .await
    {
        Ok(batch) => {
            log::info!("✅ Batch {} complete with {} variants", batch.id, batch.results.len());
            if let Some(size) = &batch.suggested_size {
                log::info!("📏 Suggested size: {}", size);
            } else {
                log::warn!("📏 No size was determined for this batch");
            }

            for (index, result) in batch.results.iter().enumerate() {
                let Some(image) = &result.image else { continue };
                let extension = match image.mime_type.as_str() {
                    "image/png" => "png",
                    _ => "jpg",
                };
                let filename = format!(
                    "tryon_{}_{}_pose{}.{}",
                    scenario.id,
                    chrono::Utc::now().timestamp(),
                    index + 1,
                    extension
                );
                match BASE64.decode(&image.data) {
                    Ok(bytes) => match fs::write(&filename, bytes) {
                        Ok(_) => log::info!("💾 Variant saved to: {}", filename),
                        Err(e) => log::error!("❌ Failed to save variant: {}", e),
                    },
                    Err(e) => log::error!("❌ Failed to decode variant payload: {}", e),
                }
            }
        }
        Err(e) => {
            log::error!("❌ Batch generation failed: {}", e);
            return Err(e.into());
        }
    }

    log::info!("🏷️  Inferring garment tags...");
    let tags = client.tags().infer(&garment_bytes).await;
    if tags.is_empty() {
        log::warn!("No tags were inferred for this garment");
    } else {
        log::info!("🏷️  Tags: {}", tags.join(", "));
    }

    Ok(())
}
