use crate::cli::RequestArgs;
use crate::config::TripgenConfig;
use crate::serve::build_pipeline;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tripgen_core::{build_prompt, TripRequest};

/// Run the full pipeline once and print the outcome.
pub async fn run(args: RequestArgs, config: &TripgenConfig) -> Result<()> {
    let req = read_request(&args.request)?;
    let pipeline = build_pipeline(config)?;

    match pipeline.run(&req).await {
        Ok(outcome) => {
            println!("Trip {} is {}", outcome.trip_id, outcome.status);
            Ok(())
        }
        Err(e) => anyhow::bail!(
            "Pipeline failed at {} ({}): {}",
            e.failed_stage(),
            e.kind(),
            e
        ),
    }
}

/// Print the prompt without calling the generator.
pub fn prompt(args: RequestArgs) -> Result<()> {
    let req = read_request(&args.request)?;
    print!("{}", build_prompt(&req));
    Ok(())
}

fn read_request(path: &Path) -> Result<TripRequest> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).context("Invalid trip request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_request_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tripId":"t1","destination":"Lisbon","startDate":"2025-05-01","endDate":"2025-05-07","travelers":2,"budget":1500,"travelStyle":"relaxed","pace":"slow","startingCity":"NYC","surpriseMe":true}}"#
        )
        .unwrap();

        let req = read_request(file.path()).unwrap();
        assert_eq!(req.trip_id, "t1");
        assert!(req.surprise_me);
        assert!(build_prompt(&req).as_str().contains("Lisbon"));
    }

    #[test]
    fn test_read_request_rejects_incomplete() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tripId":"t1"}}"#).unwrap();

        let err = read_request(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid trip request"));
    }
}
