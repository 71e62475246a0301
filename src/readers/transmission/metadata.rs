//! Header layout of Perkin Elmer Lambda `.asc` files
//!
//! The header is addressed by fixed line numbers. The positions below match
//! the UV/VIS/NIR export format; a different firmware layout shows up as
//! skipped metadata in the log rather than as an error.

use chrono::{NaiveDate, NaiveTime, SecondsFormat};

use crate::core::template::{Template, TemplateValue};
use crate::readers::extract::{float_line, line, ExtractError, ExtractionRule};

/// Lower end of the spectrometer range, in nm
pub const MIN_WAVELENGTH: f64 = 190.0;
/// Upper end of the spectrometer range, in nm
pub const MAX_WAVELENGTH: f64 = 3350.0;

const SAMPLE_NAME_LINE: usize = 8;
const DATE_LINE: usize = 3;
const TIME_LINE: usize = 4;
const DETECTOR_SLIT_LINE: usize = 31;
const DETECTOR_TIME_LINE: usize = 32;
const DETECTOR_GAIN_LINE: usize = 35;
const MONOCHROMATOR_CHANGE_LINE: usize = 41;
const LAMP_CHANGE_LINE: usize = 42;
const DETECTOR_CHANGE_LINE: usize = 43;
const ATTENUATOR_LINE: usize = 47;

/// Template paths filled from the header of an `.asc` file
pub const METADATA_MAP: &[(&str, ExtractionRule)] = &[
    ("/ENTRY[entry]/SAMPLE[sample]/name", ExtractionRule::Index(SAMPLE_NAME_LINE)),
    ("/ENTRY[entry]/start_time", ExtractionRule::Transform(read_start_date)),
    (
        "/ENTRY[entry]/instrument/sample_attenuator/attenuator_transmission",
        ExtractionRule::Transform(read_sample_attenuator),
    ),
    (
        "/ENTRY[entry]/instrument/ref_attenuator/attenuator_transmission",
        ExtractionRule::Transform(read_ref_attenuator),
    ),
    (
        "/ENTRY[entry]/instrument/spectrometer/GRATING[grating]/wavelength_range",
        ExtractionRule::Transform(read_uv_monochromator_range),
    ),
    (
        "/ENTRY[entry]/instrument/spectrometer/GRATING[grating1]/wavelength_range",
        ExtractionRule::Transform(read_visir_monochromator_range),
    ),
    ("/ENTRY[entry]/instrument/SOURCE[source]/type", ExtractionRule::Literal("D2")),
    (
        "/ENTRY[entry]/instrument/SOURCE[source]/wavelength_range",
        ExtractionRule::Transform(get_d2_range),
    ),
    ("/ENTRY[entry]/instrument/SOURCE[source1]/type", ExtractionRule::Literal("halogen")),
    (
        "/ENTRY[entry]/instrument/SOURCE[source1]/wavelength_range",
        ExtractionRule::Transform(get_halogen_range),
    ),
];

/// Measurement start from the `yy/mm/dd` date and `HH:MM:SS.ff` time lines, as UTC ISO 8601
pub fn read_start_date(lines: &[String]) -> Result<TemplateValue, ExtractError> {
    let date_text = line(lines, DATE_LINE)?;
    let time_text = line(lines, TIME_LINE)?;

    let date = NaiveDate::parse_from_str(date_text.trim(), "%y/%m/%d").map_err(|_| {
        ExtractError::Parse {
            index: DATE_LINE,
            what: "a yy/mm/dd date",
            text: date_text.to_string(),
        }
    })?;
    let time = NaiveTime::parse_from_str(time_text.trim(), "%H:%M:%S%.f").map_err(|_| {
        ExtractError::Parse {
            index: TIME_LINE,
            what: "a HH:MM:SS time",
            text: time_text.to_string(),
        }
    })?;

    Ok(TemplateValue::Text(
        date.and_time(time)
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Micros, true),
    ))
}

/// Attenuator setting from the `S:<sample> R:<reference>` line
fn attenuator(lines: &[String], position: usize) -> Result<TemplateValue, ExtractError> {
    let text = line(lines, ATTENUATOR_LINE)?;
    text.split_whitespace()
        .nth(position)
        .and_then(|token| token.split(':').nth(1))
        .and_then(|value| value.parse::<i64>().ok())
        .map(TemplateValue::Int)
        .ok_or_else(|| ExtractError::Parse {
            index: ATTENUATOR_LINE,
            what: "an attenuator setting",
            text: text.to_string(),
        })
}

pub fn read_sample_attenuator(lines: &[String]) -> Result<TemplateValue, ExtractError> {
    attenuator(lines, 0)
}

pub fn read_ref_attenuator(lines: &[String]) -> Result<TemplateValue, ExtractError> {
    attenuator(lines, 1)
}

pub fn read_uv_monochromator_range(lines: &[String]) -> Result<TemplateValue, ExtractError> {
    let change = float_line(lines, MONOCHROMATOR_CHANGE_LINE)?;
    Ok(TemplateValue::Vector(vec![MIN_WAVELENGTH, change]))
}

pub fn read_visir_monochromator_range(lines: &[String]) -> Result<TemplateValue, ExtractError> {
    let change = float_line(lines, MONOCHROMATOR_CHANGE_LINE)?;
    Ok(TemplateValue::Vector(vec![change, MAX_WAVELENGTH]))
}

pub fn get_d2_range(lines: &[String]) -> Result<TemplateValue, ExtractError> {
    let change = float_line(lines, LAMP_CHANGE_LINE)?;
    Ok(TemplateValue::Vector(vec![MIN_WAVELENGTH, change]))
}

pub fn get_halogen_range(lines: &[String]) -> Result<TemplateValue, ExtractError> {
    let change = float_line(lines, LAMP_CHANGE_LINE)?;
    Ok(TemplateValue::Vector(vec![change, MAX_WAVELENGTH]))
}

/// Settings of the three detector channels, one token per detector.
/// Tokens look like `3350/servo`; only the part after the last `/` counts.
fn parse_detector_line(lines: &[String], index: usize) -> Result<Vec<String>, ExtractError> {
    Ok(line(lines, index)?
        .split_whitespace()
        .map(|token| token.rsplit('/').next().unwrap_or(token).to_string())
        .collect())
}

fn parse_detector_floats(lines: &[String], index: usize) -> Result<Vec<f64>, ExtractError> {
    parse_detector_line(lines, index)?
        .iter()
        .map(|token| {
            token.parse::<f64>().map_err(|_| ExtractError::Parse {
                index,
                what: "a detector setting",
                text: token.clone(),
            })
        })
        .collect()
}

fn pick<T: Clone>(values: &[T], position: usize, index: usize) -> Result<T, ExtractError> {
    values.get(position).cloned().ok_or(ExtractError::Parse {
        index,
        what: "a setting for every detector",
        text: format!("{} value(s)", values.len()),
    })
}

/// One detector channel
struct Detector<'a> {
    kind: &'a str,
    slit: &'a str,
    response_time: f64,
    gain: Option<f64>,
    wavelength_range: [f64; 2],
}

impl Detector<'_> {
    /// Write this detector below `DETECTOR[detector]`, or `DETECTOR[detector<n>]` for n > 0
    fn write(&self, index: usize, template: &mut Template) -> Result<(), ExtractError> {
        let path = if index == 0 {
            "/ENTRY[entry]/instrument/DETECTOR[detector]".to_string()
        } else {
            format!("/ENTRY[entry]/instrument/DETECTOR[detector{}]", index)
        };

        template.set(format!("{}/type", path), self.kind);
        template.set(format!("{}/response_time", path), self.response_time);
        if let Some(gain) = self.gain {
            template.set(format!("{}/gain", path), gain);
        }

        if self.slit == "servo" {
            template.set(format!("{}/slit/type", path), "servo");
        } else {
            let x_gap: f64 = self.slit.parse().map_err(|_| ExtractError::Parse {
                index: DETECTOR_SLIT_LINE,
                what: "a slit width",
                text: self.slit.to_string(),
            })?;
            template.set(format!("{}/slit/type", path), "fixed");
            template.set(format!("{}/slit/x_gap", path), x_gap);
            template.set(format!("{}/slit/x_gap/@units", path), "nm");
        }

        template.set(
            format!("{}/wavelength_range", path),
            self.wavelength_range.to_vec(),
        );
        Ok(())
    }
}

/// Detector configuration for the PMT, PbS and InGaAs channels.
///
/// The detector change wavelengths split the full range into three
/// sub-ranges: PMT covers the UV end, InGaAs the NIR end.
pub fn read_detectors(lines: &[String]) -> Result<Template, ExtractError> {
    let slits = parse_detector_line(lines, DETECTOR_SLIT_LINE)?;
    let times = parse_detector_floats(lines, DETECTOR_TIME_LINE)?;
    let gains = parse_detector_floats(lines, DETECTOR_GAIN_LINE)?;

    let change_text = line(lines, DETECTOR_CHANGE_LINE)?;
    let mut changes = change_text
        .split_whitespace()
        .map(|token| token.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|_| ExtractError::Parse {
            index: DETECTOR_CHANGE_LINE,
            what: "detector change wavelengths",
            text: change_text.to_string(),
        })?;
    changes.reverse();

    let mut ranges = vec![MIN_WAVELENGTH];
    ranges.extend(changes);
    ranges.push(MAX_WAVELENGTH);
    if ranges.len() < 4 {
        return Err(ExtractError::Parse {
            index: DETECTOR_CHANGE_LINE,
            what: "two detector change wavelengths",
            text: change_text.to_string(),
        });
    }

    let mut template = Template::new();

    let pmt_slit = pick(&slits, 2, DETECTOR_SLIT_LINE)?;
    Detector {
        kind: "PMT",
        slit: &pmt_slit,
        response_time: pick(&times, 2, DETECTOR_TIME_LINE)?,
        gain: None,
        wavelength_range: [ranges[0], ranges[1]],
    }
    .write(2, &mut template)?;

    for (kind, idx) in [("PbS", 1usize), ("InGaAs", 0usize)] {
        let slit = pick(&slits, idx, DETECTOR_SLIT_LINE)?;
        Detector {
            kind,
            slit: &slit,
            response_time: pick(&times, idx, DETECTOR_TIME_LINE)?,
            gain: Some(pick(&gains, idx, DETECTOR_GAIN_LINE)?),
            wavelength_range: [ranges[2 - idx], ranges[3 - idx]],
        }
        .write(idx, &mut template)?;
    }

    Ok(template)
}
