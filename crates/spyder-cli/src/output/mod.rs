//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use spyder::{Enumeration, Source};
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored listing with the discovery source
    #[default]
    Pretty,
    /// JSON document with every domain
    Json,
    /// One name per line
    Plain,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "plain" | "txt" => Ok(Self::Plain),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json, plain",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// Render `found` for `target` in `format`.
pub fn render(found: &Enumeration, target: &str, format: OutputFormat) -> Result<String> {
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "target": target,
                "count": found.len(),
                "cancelled": found.cancelled,
                "domains": found.domains(),
            });
            out.push_str(&serde_json::to_string_pretty(&doc)?);
            out.push('\n');
        }
        OutputFormat::Plain => {
            for name in found.names() {
                writeln!(out, "{name}")?;
            }
        }
        OutputFormat::Pretty => {
            for domain in found.domains() {
                let tag = match domain.source {
                    Source::Certstream => "certstream".cyan(),
                    Source::Brute => "brute".green(),
                    Source::Recursive => "recursive".yellow(),
                };
                writeln!(out, "{}  [{}]", domain.name, tag)?;
            }
            writeln!(out)?;
            let summary = format!("{} unique subdomains of {}", found.len(), target);
            if found.cancelled {
                writeln!(out, "{} {}", summary.bold(), "(partial: run was cancelled)".dimmed())?;
            } else {
                writeln!(out, "{}", summary.bold())?;
            }
        }
    }

    Ok(out)
}

/// Write the found names to `path`, one per line.
pub fn write_names(found: &Enumeration, path: &Path) -> Result<()> {
    let mut content = String::new();
    for name in found.names() {
        content.push_str(name);
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spyder::{Domain, Enumeration};

    fn sample() -> Enumeration {
        serde_json::from_value::<Vec<Domain>>(serde_json::json!([
            {"name": "www.example.com", "source": "brute", "discovered_at": "2026-01-01T00:00:00Z"},
            {"name": "dev-www.example.com", "source": "recursive", "discovered_at": "2026-01-01T00:00:01Z"}
        ]))
        .map(Enumeration::from)
        .unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_plain_is_one_name_per_line() {
        let out = render(&sample(), "example.com", OutputFormat::Plain).unwrap();
        assert_eq!(out, "www.example.com\ndev-www.example.com\n");
    }

    #[test]
    fn test_json_document() {
        let out = render(&sample(), "example.com", OutputFormat::Json).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["count"], 2);
        assert_eq!(doc["domains"][1]["source"], "recursive");
        assert_eq!(doc["cancelled"], false);
    }

    #[test]
    fn test_write_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.txt");
        write_names(&sample(), &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "www.example.com\ndev-www.example.com\n"
        );
    }
}
