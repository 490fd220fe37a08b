//! The `scorecalc init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("scorecalc.toml").exists() {
        println!("scorecalc.toml already exists, skipping.");
    } else {
        std::fs::write("scorecalc.toml", SAMPLE_CONFIG)?;
        println!("Created scorecalc.toml");
    }

    std::fs::create_dir_all("sessions")?;
    let example_path = std::path::Path::new("sessions/example.json");
    if example_path.exists() {
        println!("sessions/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SESSION)?;
        println!("Created sessions/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Set SCORECALC_SIGNING_KEY if you want signed reports");
    println!("  2. Run: scorecalc validate --sessions sessions/example.json");
    println!("  3. Run: scorecalc score --sessions sessions/example.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# scorecalc configuration

parallelism = 4
output_dir = "./scorecalc-results"
signing_key = "${SCORECALC_SIGNING_KEY}"

[calculator]
# abort: the first failing answer fails the session
# record: keep going, mark the answer failed, withhold the total
failure_policy = "abort"
# sum, mean, min, max
aggregation = "sum"
"#;

const EXAMPLE_SESSION: &str = r#"{
  "id": 1,
  "dateTime": "2024-03-01T10:00:00Z",
  "iskid": false,
  "answers": [
    {
      "possibleAnswer": {
        "id": 1,
        "name": "Gas heating",
        "formula": "10 + 5",
        "question": { "id": 1, "name": "Heating" }
      }
    },
    {
      "possibleAnswer": {
        "id": 2,
        "name": "Car",
        "formula": "distance * factor",
        "question": { "id": 2, "name": "Commute" }
      },
      "variableValues": [
        { "variable": { "name": "distance" }, "value": 100 },
        { "variable": { "name": "factor" }, "value": 2.5 }
      ]
    }
  ]
}
"#;
