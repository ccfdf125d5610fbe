//! Rapid CLI
//!
//! ```bash
//! rapid csv-to-json input.csv -d ';' --skip-leading 2   # Delimited text to JSON
//! rapid standardize response.json -o fields.json        # Data License response to field rows
//! rapid serve --port 7071                               # Start HTTP triggers
//! ```
//!
//! `-` reads the input from stdin.

use clap::{Parser, Subcommand};
use rapid::{convert, server::ServerConfig, standardize, ContentEncoding, ConversionRequest};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rapid")]
#[command(about = "Convert CSV to JSON and standardize Data License responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert delimited text to a JSON array of row objects
    CsvToJson {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Field delimiter, may be several characters
        #[arg(short, long, default_value = ",")]
        delimiter: String,

        /// First row is data, columns are named Field1, Field2, ...
        #[arg(long)]
        no_header: bool,

        /// Rows to drop at the start (ignored blank rows are not counted)
        #[arg(long, default_value = "0")]
        skip_leading: usize,

        /// Parsed rows to drop at the end
        #[arg(long, default_value = "0")]
        skip_trailing: usize,

        /// Keep rows whose fields are all empty
        #[arg(long)]
        keep_blank_lines: bool,

        /// Content encoding: auto, base64 or plain
        #[arg(short, long, default_value = "plain", value_parser = parse_encoding)]
        encoding: ContentEncoding,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Flatten a Data License JSON response into one record per field
    Standardize {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = ServerConfig::DEFAULT_PORT)]
        port: u16,
    },
}

fn parse_encoding(name: &str) -> Result<ContentEncoding, String> {
    ContentEncoding::from_name(name)
        .ok_or_else(|| format!("unknown encoding '{}', expected auto, base64 or plain", name))
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::CsvToJson {
            input,
            delimiter,
            no_header,
            skip_leading,
            skip_trailing,
            keep_blank_lines,
            encoding,
            output,
        } => {
            let request = ConversionRequest::default()
                .with_delimiter(delimiter)
                .with_header_row(!no_header)
                .with_skip_leading_rows(skip_leading)
                .with_skip_trailing_rows(skip_trailing)
                .with_ignore_blank_lines(!keep_blank_lines)
                .with_encoding(encoding);
            cmd_csv_to_json(&input, request, output.as_deref())
        }

        Commands::Standardize { input, output } => cmd_standardize(&input, output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_csv_to_json(
    input: &Path,
    settings: ConversionRequest,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ConversionRequest {
        content: read_input(input)?,
        ..settings
    };

    let result = convert(&request);
    if !result.is_success {
        return Err(result.message.into());
    }
    write_output(&result.result, output)
}

fn cmd_standardize(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = read_input(input)?;

    let result = standardize(&json);
    if !result.is_success {
        return Err(result.message.into());
    }
    write_output(&result.result, output)
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    rapid::server::start_server(ServerConfig::from_env(port)).await?;
    Ok(())
}

fn read_input(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        fs::read_to_string(path)
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_csv_options() {
        let cli = Cli::try_parse_from([
            "rapid", "csv-to-json", "in.csv", "-d", "||", "--no-header", "--skip-leading", "2",
            "--encoding", "base64",
        ])
        .unwrap();

        match cli.command {
            Commands::CsvToJson {
                delimiter,
                no_header,
                skip_leading,
                skip_trailing,
                encoding,
                ..
            } => {
                assert_eq!(delimiter, "||");
                assert!(no_header);
                assert_eq!(skip_leading, 2);
                assert_eq!(skip_trailing, 0);
                assert_eq!(encoding, ContentEncoding::Base64);
            }
            _ => panic!("expected csv-to-json"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_encoding() {
        let parsed = Cli::try_parse_from(["rapid", "csv-to-json", "in.csv", "--encoding", "gzip"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.json");
        fs::write(&input, "a;b\n1;2\n").unwrap();

        let settings = ConversionRequest::default()
            .with_delimiter(";")
            .with_encoding(ContentEncoding::Plain);
        cmd_csv_to_json(&input, settings, Some(&output)).unwrap();

        let rows: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(rows, serde_json::json!([{"a": "1", "b": "2"}]));
    }

    #[test]
    fn test_standardize_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("response.json");
        let output = dir.path().join("out.json");
        fs::write(&input, "[]").unwrap();

        let err = cmd_standardize(&input, Some(&output)).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse JSON string");
        assert!(!output.exists());
    }

    #[test]
    fn test_standardize_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("response.json");
        let output = dir.path().join("out.json");
        fs::write(&input, r#"[{"IDENTIFIER": "IBM US Equity", "PX_LAST": "140.1"}]"#).unwrap();

        cmd_standardize(&input, Some(&output)).unwrap();

        let records: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(records[0]["Identifier"], "IBM US Equity");
        assert_eq!(records[0]["Value"], "140.1");
    }

    #[test]
    fn test_missing_input_file() {
        assert!(read_input(Path::new("/definitely/not/here.csv")).is_err());
    }
}
