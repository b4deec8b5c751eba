use anyhow::Result;
use clap::Parser;
use portfolio::reporter::{DEFAULT_ENDPOINT, View, send_view};
use reqwest::Client;

/// Sends view reports to a running counter and prints what came back.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    unit: String,

    slug: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Send the same view this many times, the repeats should come back as not counted.
    #[arg(long, default_value_t = 1)]
    repeat: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let client = Client::new();
    let view = View {
        unit: args.unit,
        slug: args.slug,
    };

    println!("Reporting {}:{} to {}\n", view.unit, view.slug, args.endpoint);

    for attempt in 1..=args.repeat {
        let response = send_view(&client, &args.endpoint, &view).await?;
        let counted = response
            .headers()
            .get("x-view-counted")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-")
            .to_string();

        println!(
            "#{attempt}: {} counted={counted} {}",
            response.status(),
            response.text().await?
        );
    }

    Ok(())
}
