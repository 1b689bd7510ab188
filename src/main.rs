use std::path::Path;

use log::info;

use tour_shifts::config::AppConfig;
use tour_shifts::display::print_import_summary;
use tour_shifts::{import_csv, import_ics, import_ics_feed, web};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = AppConfig::from_env()?;
    let taxonomy = config.load_taxonomy()?;

    // Server mode: `tour-shifts [serve [port]]`
    if args.len() < 2 || args[1] == "serve" {
        if let Some(port) = args.get(2).and_then(|p| p.parse::<u16>().ok()) {
            config.port = port;
        }
        web::start_server(config, taxonomy).await?;
        return Ok(());
    }

    // One-shot mode: `tour-shifts <bookings.csv|feed.ics|feed-url> [result.json]`
    let input = args[1].as_str();
    let options = config.import_options();

    let result = if input.starts_with("http://") || input.starts_with("https://") || input.starts_with("webcal://") {
        import_ics_feed(&reqwest::Client::new(), input, &taxonomy, &options).await?
    } else {
        let text = std::fs::read_to_string(input)?;
        let is_calendar = Path::new(input)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("ics"))
            .unwrap_or(false);
        if is_calendar {
            import_ics(&text, &taxonomy, &options)
        } else {
            import_csv(&text, &taxonomy, &options)?
        }
    };

    print_import_summary(&result);

    if let Some(out) = args.get(2) {
        result.write_json(out)?;
        info!("Import result written to {}", out);
    }

    Ok(())
}
