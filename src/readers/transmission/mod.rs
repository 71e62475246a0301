//! Perkin Elmer transmission reader
//!
//! Converts Lambda UV/VIS/NIR `.asc` exports, optionally enriched by JSON or
//! YAML metadata files, into an `NXtransmission` template.

pub mod metadata;

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::core::template::Template;
use crate::readers::base::{read_files, FileParser, ParseError, Reader};
use crate::readers::extract::apply_metadata_map;
use crate::readers::utils::{flatten_and_replace, load_json, load_yaml, object_as_template};

/// Line separating the header from the data table
const DATA_START: &str = "#DATA";

/// Renames applied to ELN keys while flattening YAML metadata
const CONVERT_DICT: &[(&str, &str)] = &[];
/// Rewrites applied to nested ELN paths while flattening YAML metadata
const REPLACE_NESTED: &[(&str, &str)] = &[];

const DEFINITION_URL: &str = "https://fairmat-experimental.github.io/nexus-fairmat-proposal/\
50433d9039b3f33299bab338998acb5335cd8951/index.html";

const EXTENSIONS: &[(&str, FileParser)] = &[
    (".asc", parse_asc),
    (".json", parse_json),
    (".yml", parse_yml),
    (".yaml", parse_yml),
];

pub struct TransmissionReader;

pub fn create() -> Box<dyn Reader> {
    Box::new(TransmissionReader)
}

impl Reader for TransmissionReader {
    fn name(&self) -> &'static str {
        "transmission"
    }

    fn supported_nxdls(&self) -> &'static [&'static str] {
        &["NXtransmission"]
    }

    fn read(&self, mut template: Template, file_paths: &[PathBuf], _extra: &[JsonValue]) -> Template {
        template.set("/@default", "entry");
        template.set("/ENTRY[entry]/@default", "data");
        template.set("/ENTRY[entry]/definition", "NXtransmission");
        template.set("/ENTRY[entry]/definition/@version", "v2022.06");
        template.set("/ENTRY[entry]/definition/@url", DEFINITION_URL);

        read_files(&mut template, file_paths, EXTENSIONS);
        template
    }
}

/// Numeric table below the header: first column is the wavelength
#[derive(Debug, Default, PartialEq)]
struct DataTable {
    index: Vec<f64>,
    values: Vec<Vec<f64>>,
}

fn parse_table(lines: &[&str], path: &Path) -> Result<DataTable, ParseError> {
    let mut table = DataTable::default();
    let mut width = None;

    for (row, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let numbers = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| ParseError::format(path, format!("data row {} is not numeric: '{}'", row + 1, line)))?;

        if numbers.len() < 2 {
            return Err(ParseError::format(
                path,
                format!("data row {} has no value column", row + 1),
            ));
        }
        match width {
            None => width = Some(numbers.len()),
            Some(w) if w != numbers.len() => {
                return Err(ParseError::format(
                    path,
                    format!("data row {} has {} columns, expected {}", row + 1, numbers.len(), w),
                ));
            }
            _ => {}
        }

        table.index.push(numbers[0]);
        table.values.push(numbers[1..].to_vec());
    }

    if table.index.is_empty() {
        return Err(ParseError::format(path, "no data rows after #DATA"));
    }
    Ok(table)
}

/// Data group, signal/axes attributes and the raw measurement matrix
fn data_to_template(table: DataTable) -> Template {
    let transmission: Vec<f64> = table.values.iter().map(|row| row[0]).collect();

    let mut template = Template::new();
    template.set("/ENTRY[entry]/data/@axes", "wavelength");
    template.set("/ENTRY[entry]/data/type", "transmission");
    template.set("/ENTRY[entry]/data/@signal", "transmission");
    template.set("/ENTRY[entry]/data/wavelength", table.index.clone());
    template.set("/ENTRY[entry]/instrument/spectrometer/wavelength", table.index);
    template.set("/ENTRY[entry]/data/wavelength/@units", "nm");
    template.set("/ENTRY[entry]/data/transmission", transmission);
    template.set("/ENTRY[entry]/instrument/measured_data", table.values);
    template
}

/// Parse a Perkin Elmer `.asc` export into header metadata and data paths
pub fn parse_asc(path: &Path) -> Result<Template, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines = content.lines();
    let mut header: Vec<String> = Vec::new();
    let mut found_data = false;
    for line in lines.by_ref() {
        if line.trim() == DATA_START {
            found_data = true;
            break;
        }
        header.push(line.trim().to_string());
    }
    if !found_data {
        return Err(ParseError::format(path, format!("no {} marker found", DATA_START)));
    }
    let table = parse_table(&lines.collect::<Vec<_>>(), path)?;

    let mut template = Template::new();
    apply_metadata_map(metadata::METADATA_MAP, &header, &mut template);
    match metadata::read_detectors(&header) {
        Ok(detectors) => template.merge(detectors),
        Err(e) => tracing::warn!(file = %path.display(), error = %e, "detector settings skipped"),
    }
    template.merge(data_to_template(table));

    Ok(template)
}

/// A JSON object whose keys are template paths
pub fn parse_json(path: &Path) -> Result<Template, ParseError> {
    object_as_template(load_json(path)?, path)
}

/// ELN-style YAML metadata, flattened below `/ENTRY[entry]`
pub fn parse_yml(path: &Path) -> Result<Template, ParseError> {
    Ok(flatten_and_replace(&load_yaml(path)?, CONVERT_DICT, REPLACE_NESTED))
}
