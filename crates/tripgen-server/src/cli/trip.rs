use crate::cli::TripCommands;
use crate::config::TripgenConfig;
use crate::serve::build_store;
use anyhow::Result;
use serde_json::{json, Value};

pub async fn run(cmd: TripCommands, config: &TripgenConfig) -> Result<()> {
    let store = build_store(config)?;
    match cmd {
        TripCommands::Create(args) => {
            store.create(&args.trip_id).await?;
            println!("Created trip {} (PENDING)", args.trip_id);
        }
        TripCommands::Get(args) => match store.get(&args.trip_id).await? {
            Some(record) => {
                let mut doc = serde_json::to_value(&record)?;
                if let Value::Object(map) = &mut doc {
                    map.insert("tripId".to_string(), json!(record.trip_id));
                }
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
            None => anyhow::bail!("Trip not found: {}", args.trip_id),
        },
    }
    Ok(())
}
