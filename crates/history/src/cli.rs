use anyhow::{Context, Result};
use common::config::Config;
use common::types::{Address, TransactionRecord};
use history::enrichment::{EnrichmentContext, HydratedMapper};
use history::{HistoryAssembler, HistoryQuery};

const USAGE: &str = "usage: history --safe <address> [--config <path>] [--offset <n>] \
[--tz-offset <seconds>] [--hide-imitations] [--only-trusted] <records.json>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<String>,
    pub safe: String,
    pub records_path: String,
    pub query: HistoryQuery,
}

fn value_of<I>(args: &mut I, flag: &str) -> std::result::Result<String, String>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| format!("{flag} expects a value\n{USAGE}"))
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Args, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let mut config = None;
    let mut safe = None;
    let mut records_path = None;
    let mut query = HistoryQuery::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(value_of(&mut args, "--config")?),
            "--safe" => safe = Some(value_of(&mut args, "--safe")?),
            "--offset" => {
                let raw = value_of(&mut args, "--offset")?;
                query.offset = raw
                    .parse()
                    .map_err(|e| format!("invalid --offset {raw}: {e}"))?;
            }
            "--tz-offset" => {
                let raw = value_of(&mut args, "--tz-offset")?;
                query.timezone_offset_seconds = raw
                    .parse()
                    .map_err(|e| format!("invalid --tz-offset {raw}: {e}"))?;
            }
            "--hide-imitations" => query.suppress_imitations = true,
            "--only-trusted" => query.only_trusted = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown option: {other}\n{USAGE}"));
            }
            _ => {
                if records_path.replace(arg).is_some() {
                    return Err(format!("only one records file may be given\n{USAGE}"));
                }
            }
        }
    }

    Ok(Args {
        config,
        safe: safe.ok_or_else(|| format!("--safe is required\n{USAGE}"))?,
        records_path: records_path.ok_or_else(|| USAGE.to_string())?,
        query,
    })
}

/// Assemble the page in `args.records_path` and render it as pretty JSON.
pub async fn run(config: &Config, args: &Args) -> Result<String> {
    let safe = Address::parse(&args.safe).context("invalid --safe address")?;
    let content = std::fs::read_to_string(&args.records_path)
        .with_context(|| format!("failed to read records file: {}", args.records_path))?;
    let records: Vec<TransactionRecord> =
        serde_json::from_str(&content).context("failed to parse records page")?;

    let context = EnrichmentContext {
        chain_id: config.history.chain_id.clone(),
        safe,
    };
    let assembler = HistoryAssembler::new(HydratedMapper, context, config);
    let entries = assembler.assemble(&records, &args.query).await?;
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn argv(args: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("history".to_string())
            .chain(args.iter().map(std::string::ToString::to_string))
            .collect::<Vec<_>>()
            .into_iter()
    }

    const SAFE: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    #[test]
    fn test_parse_minimal() {
        let args = parse_args(argv(&["--safe", SAFE, "page.json"])).unwrap();
        assert_eq!(args.records_path, "page.json");
        assert_eq!(args.query, HistoryQuery::default());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_parse_all_options() {
        let args = parse_args(argv(&[
            "--config",
            "custom.toml",
            "--safe",
            SAFE,
            "--offset",
            "20",
            "--tz-offset",
            "-3600",
            "--hide-imitations",
            "--only-trusted",
            "page.json",
        ]))
        .unwrap();
        assert_eq!(args.config.as_deref(), Some("custom.toml"));
        assert_eq!(
            args.query,
            HistoryQuery {
                offset: 20,
                timezone_offset_seconds: -3600,
                suppress_imitations: true,
                only_trusted: true,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(argv(&["page.json"])).unwrap_err().contains("--safe"));
        assert!(parse_args(argv(&["--safe", SAFE])).is_err());
        assert!(parse_args(argv(&["--safe", SAFE, "--offset", "x", "p.json"])).is_err());
        assert!(parse_args(argv(&["--safe", SAFE, "--verbose", "p.json"]))
            .unwrap_err()
            .contains("unknown option"));
        assert!(parse_args(argv(&["--safe", SAFE, "a.json", "b.json"])).is_err());
    }

    #[tokio::test]
    async fn test_run_renders_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"txType": "CREATION", "created": "2024-01-05T10:00:00Z",
                  "creator": "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359",
                  "transactionHash": "0x01"}}
            ]"#
        )
        .unwrap();

        let args = Args {
            config: None,
            safe: SAFE.to_string(),
            records_path: file.path().display().to_string(),
            query: HistoryQuery::default(),
        };
        let out = run(&Config::default(), &args).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["type"], "DATE_LABEL");
        assert_eq!(value[1]["type"], "TRANSACTION");
        assert_eq!(value[1]["transaction"]["info"]["type"], "CREATION");
    }
}
