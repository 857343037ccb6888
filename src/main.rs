use owt::config::Config;
use owt::pipeline::BatchProcessor;

const DEFAULT_CONFIG: &str = "./data/config/owt_config.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    println!("Starting optical water type classification...");

    let config = Config::from_file(&config_path)?;

    let processor = BatchProcessor::new(config)?;
    let summary = processor.process()?;

    println!("{}", summary);

    if summary.pixels > 0 {
        let classified = summary.pixels - summary.unclassifiable;
        println!(
            "  Classified: {:.1} %",
            100.0 * classified as f64 / summary.pixels as f64
        );
        if let Some((name, count)) = summary.type_counts.iter().max_by_key(|(_, count)| *count) {
            println!("  Dominant type: OWT {} ({} pixels)", name, count);
        }
    }

    Ok(())
}
