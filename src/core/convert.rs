//! Conversion orchestration: schema → template → reader → validation → output

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::core::config::{DEFAULT_OUTPUT, DEFAULT_READER};
use crate::core::error::ConvertError;
use crate::core::template::Template;
use crate::readers::ReaderRegistry;
use crate::schema::{self, nxdl_name_from_path, GeneratedTemplate, SchemaNode, ValidationResult};
use crate::writer::TemplateWriter;

/// What a finished conversion produced
#[derive(Debug)]
pub struct ConversionOutcome {
    /// Application definition name, e.g. `NXtransmission`
    pub nxdl_name: String,
    /// Template as returned by the reader
    pub template: Template,
    pub report: ValidationResult,
    pub output: PathBuf,
}

/// One conversion run, configured builder style
#[derive(Debug, Clone)]
pub struct Conversion {
    nxdl: PathBuf,
    reader: String,
    inputs: Vec<PathBuf>,
    extra: Vec<JsonValue>,
    output: PathBuf,
    strict: bool,
    registry: ReaderRegistry,
}

impl Conversion {
    pub fn new(nxdl: impl Into<PathBuf>) -> Self {
        Self {
            nxdl: nxdl.into(),
            reader: DEFAULT_READER.to_string(),
            inputs: Vec::new(),
            extra: Vec::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            strict: false,
            registry: ReaderRegistry::default(),
        }
    }

    pub fn reader(mut self, name: impl Into<String>) -> Self {
        self.reader = name.into();
        self
    }

    pub fn inputs(mut self, inputs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Additional metadata objects handed to the reader after its files
    pub fn extra(mut self, objects: impl IntoIterator<Item = JsonValue>) -> Self {
        self.extra.extend(objects);
        self
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Refuse to write output when validation reports errors
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn registry(mut self, registry: ReaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn nxdl_path(&self) -> &Path {
        &self.nxdl
    }

    /// Parse the schema and generate its template without running a reader
    pub fn template(&self) -> Result<GeneratedTemplate, ConvertError> {
        let root = schema::nxdl::load(&self.nxdl)?;
        Ok(schema::generate_template(&root)?)
    }

    /// Run the whole conversion and hand the result to `writer`
    pub fn run(&self, writer: &dyn TemplateWriter) -> Result<ConversionOutcome, ConvertError> {
        let root = schema::nxdl::load(&self.nxdl)?;
        let generated = schema::generate_template(&root)?;
        let nxdl_name = self.resolve_nxdl_name(&root)?;

        let reader = self.registry.load(&self.reader)?;
        if !reader.supports(&nxdl_name) {
            return Err(ConvertError::UnsupportedNxdl {
                nxdl: nxdl_name,
                reader: reader.name().to_string(),
                supported: reader.supported_nxdls().join(", "),
            });
        }
        tracing::info!(reader = reader.name(), nxdl = %nxdl_name, inputs = self.inputs.len(), "running reader");

        let required = generated.template;
        let populated = reader.read(required.clone(), &self.inputs, &self.extra);
        for (path, value) in populated.iter() {
            if let Some(value) = value {
                tracing::debug!(path, value = %value, "template path filled");
            }
        }

        let report = schema::validate(&required, &populated, &root);
        for issue in &report.warnings {
            tracing::warn!(path = %issue.path, "{}", issue.message);
        }
        if self.strict {
            if let Some(error) = report.to_error() {
                return Err(error.into());
            }
        }

        writer.write(&populated, &self.nxdl, &self.output)?;

        Ok(ConversionOutcome {
            nxdl_name,
            template: populated,
            report,
            output: self.output.clone(),
        })
    }

    /// Definition name from the file name, else from the root `name` attribute
    fn resolve_nxdl_name(&self, root: &SchemaNode) -> Result<String, ConvertError> {
        if let Some(name) = nxdl_name_from_path(&self.nxdl) {
            return Ok(name);
        }
        match root.attr("name").filter(|n| n.starts_with("NX")) {
            Some(name) => {
                tracing::info!(name, "using the definition name declared in the schema");
                Ok(name.to_string())
            }
            None => Err(ConvertError::NxdlNameUnresolved {
                path: self.nxdl.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::TemplateValue;
    use crate::schema::PathStatus;
    use crate::writer::WriteError;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const NXTEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definition name="NXtest" type="group" extends="NXobject">
  <group type="NXentry">
    <field name="definition"/>
    <field name="title" type="NX_CHAR"/>
    <group type="NXdata">
      <field name="wavelength" type="NX_FLOAT" units="NX_LENGTH"/>
    </group>
    <field name="notes" optional="true"/>
  </group>
</definition>
"#;

    #[derive(Default)]
    struct RecordingWriter {
        written: RefCell<Vec<(PathBuf, usize)>>,
    }

    impl TemplateWriter for RecordingWriter {
        fn write(&self, template: &Template, _nxdl: &Path, output: &Path) -> Result<(), WriteError> {
            self.written
                .borrow_mut()
                .push((output.to_path_buf(), template.len()));
            Ok(())
        }
    }

    fn schema_file(name: &str, content: &str) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_template_only() {
        let (_dir, nxdl) = schema_file("NXtest.nxdl.xml", NXTEST);
        let generated = Conversion::new(&nxdl).template().unwrap();
        let keys: Vec<&str> = generated.template.keys().collect();
        assert_eq!(
            keys,
            vec![
                "/ENTRY[entry]/DATA[data]/wavelength",
                "/ENTRY[entry]/DATA[data]/wavelength/@units",
                "/ENTRY[entry]/definition",
                "/ENTRY[entry]/notes",
                "/ENTRY[entry]/title",
            ]
        );
    }

    #[test]
    fn test_run_with_example_reader() {
        let (dir, nxdl) = schema_file("NXtest.nxdl.xml", NXTEST);
        let meta = dir.path().join("meta.yaml");
        fs::write(&meta, "title: demo\nwavelength: [1.5, 2.5]\nwavelength/@units: nm\n").unwrap();

        let writer = RecordingWriter::default();
        let outcome = Conversion::new(&nxdl)
            .reader("example")
            .inputs([meta])
            .output(dir.path().join("out.nxs"))
            .run(&writer)
            .unwrap();

        assert_eq!(outcome.nxdl_name, "NXtest");
        assert_eq!(
            outcome.template.get("/ENTRY[entry]/title"),
            Some(&TemplateValue::from("demo"))
        );
        assert!(outcome.report.is_valid(), "{:?}", outcome.report.errors);
        assert_eq!(
            outcome.report.status("/ENTRY[entry]/notes"),
            Some(PathStatus::Unfilled)
        );
        assert_eq!(writer.written.borrow().len(), 1);
    }

    #[test]
    fn test_unsupported_nxdl_fails_before_reading() {
        let (_dir, nxdl) = schema_file("NXtest.nxdl.xml", NXTEST);
        let writer = RecordingWriter::default();
        let err = Conversion::new(&nxdl)
            .reader("transmission")
            .inputs([PathBuf::from("does-not-exist.asc")])
            .run(&writer)
            .unwrap_err();

        match err {
            ConvertError::UnsupportedNxdl {
                nxdl,
                reader,
                supported,
            } => {
                assert_eq!(nxdl, "NXtest");
                assert_eq!(reader, "transmission");
                assert_eq!(supported, "NXtransmission");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(writer.written.borrow().is_empty());
    }

    #[test]
    fn test_unknown_reader() {
        let (_dir, nxdl) = schema_file("NXtest.nxdl.xml", NXTEST);
        let err = Conversion::new(&nxdl)
            .reader("nope")
            .run(&RecordingWriter::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Reader(_)));
    }

    #[test]
    fn test_strict_blocks_output() {
        let (_dir, nxdl) = schema_file("NXtest.nxdl.xml", NXTEST);
        let writer = RecordingWriter::default();
        let err = Conversion::new(&nxdl)
            .strict(true)
            .run(&writer)
            .unwrap_err();
        assert!(matches!(err, ConvertError::ValidationFailed(_)));
        assert!(writer.written.borrow().is_empty());

        let outcome = Conversion::new(&nxdl).run(&writer).unwrap();
        assert!(!outcome.report.is_valid());
        assert_eq!(writer.written.borrow().len(), 1);
    }

    #[test]
    fn test_nxdl_name_from_definition_attribute() {
        let (_dir, nxdl) = schema_file("custom.xml", NXTEST);
        let outcome = Conversion::new(&nxdl)
            .run(&RecordingWriter::default())
            .unwrap();
        assert_eq!(outcome.nxdl_name, "NXtest");

        let (_dir, nxdl) = schema_file("custom.xml", &NXTEST.replace("name=\"NXtest\"", "name=\"test\""));
        let err = Conversion::new(&nxdl)
            .run(&RecordingWriter::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::NxdlNameUnresolved { .. }));
    }

    #[test]
    fn test_missing_schema_file() {
        let err = Conversion::new("/nonexistent/NXtest.nxdl.xml")
            .template()
            .unwrap_err();
        assert!(matches!(err, ConvertError::Schema(_)));
    }
}
