use rollup::query::CumulativeRequest;
use rollup::storage::FileStore;
use rollup::{Rollup, RollupConfig};
use std::io::Read;
use std::sync::Arc;

const USAGE: &str = "usage: rollup-cli <records.jsonl> [<request json> | -] [--explain]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let explain = match args.iter().position(|a| a == "--explain") {
        Some(idx) => {
            args.remove(idx);
            true
        }
        None => false,
    };

    let (data_file, raw_request) = match args.as_slice() {
        [data_file] => (data_file.clone(), "-".to_string()),
        [data_file, raw_request] => (data_file.clone(), raw_request.clone()),
        _ => return Err(USAGE.into()),
    };

    let raw_request = if raw_request == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        raw_request
    };
    let request: CumulativeRequest = serde_json::from_str(&raw_request)?;

    let config = RollupConfig::from_env();
    let store = FileStore::open(&data_file, &config.sum_field).await?;
    let rollup = Rollup::new(config, Arc::new(store));

    if explain {
        let plan = rollup.plan(&request)?;
        println!("{}", serde_json::to_string_pretty(&plan.aggregation.to_pipeline())?);
        return Ok(());
    }

    let series = rollup.cumulative(&request).await?;
    println!("{}", serde_json::to_string(&series)?);

    Ok(())
}
