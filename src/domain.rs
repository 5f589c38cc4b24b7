use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{info, warn};

/// Loose hostname check: at least one dot and an alphabetic TLD of two or more characters.
pub fn looks_like_hostname(domain: &str) -> bool {
    if domain.len() < 3 || !domain.contains('.') {
        return false;
    }

    match domain.rfind('.') {
        Some(last_dot) if last_dot < domain.len() - 1 => {
            let tld = &domain[last_dot + 1..];
            tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        _ => false,
    }
}

/// Trims every entry and drops blank ones. Order and duplicates are kept.
pub fn clean_domains<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let domains: Vec<String> = entries
        .into_iter()
        .map(|d| d.as_ref().trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    for domain in domains.iter().filter(|d| !looks_like_hostname(d)) {
        warn!(action = "validate", component = "domain_input", domain = %domain, "Entry does not look like a hostname");
    }
    domains
}

pub fn parse_domain_list(text: &str) -> Vec<String> {
    clean_domains(text.lines())
}

/// Newline-delimited domains from a file, or from stdin when `path` is `-`.
pub fn read_domain_list(path: &Path) -> Result<Vec<String>> {
    let mut text = String::new();
    if path.as_os_str() == "-" {
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read domain list from stdin")?;
    } else {
        text = std::fs::read_to_string(path).with_context(|| format!("Failed to read domain list {:?}", path))?;
    }

    let domains = parse_domain_list(&text);
    info!(action = "loaded", component = "domain_list", file_path = ?path, domain_count = domains.len(), "Loaded domain list");
    Ok(domains)
}

/// First column of a header-less CSV file.
pub fn read_domain_file(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Error reading the uploaded file {:?}", path))?;
    read_domain_csv(file).with_context(|| format!("Error reading the uploaded file {:?}", path))
}

pub fn read_domain_csv<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut firsts = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(first) = record.get(0) {
            firsts.push(first.to_string());
        }
    }

    let domains = clean_domains(firsts);
    info!(action = "loaded", component = "domain_file", domain_count = domains.len(), "Loaded domains from CSV");
    Ok(domains)
}
