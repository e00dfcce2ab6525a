//! Processing parameters.
//!
//! These are opaque to the task-completion protocol: the client only asks
//! them for their endpoint and query pairs.

use crate::{Error, ErrorContext, Result};

/// Longest description the service accepts.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// A set of recognition options for one submission endpoint.
pub trait ProcessingParams: Send + Sync {
    /// Endpoint path relative to the service host (e.g. `v2/processImage`).
    fn endpoint(&self) -> &'static str;

    /// Query parameters, in the service's key spelling.
    fn query_pairs(&self) -> Vec<(String, String)>;

    /// Local checks run before anything is sent.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    TxtUnstructured,
    Rtf,
    Docx,
    Xlsx,
    Pptx,
    PdfSearchable,
    PdfTextAndImages,
    PdfA,
    Xml,
    XmlForCorrectedImage,
    Alto,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::TxtUnstructured => "txtUnstructured",
            ExportFormat::Rtf => "rtf",
            ExportFormat::Docx => "docx",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pptx => "pptx",
            ExportFormat::PdfSearchable => "pdfSearchable",
            ExportFormat::PdfTextAndImages => "pdfTextAndImages",
            ExportFormat::PdfA => "pdfa",
            ExportFormat::Xml => "xml",
            ExportFormat::XmlForCorrectedImage => "xmlForCorrectedImage",
            ExportFormat::Alto => "alto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let all = [
            ExportFormat::Txt,
            ExportFormat::TxtUnstructured,
            ExportFormat::Rtf,
            ExportFormat::Docx,
            ExportFormat::Xlsx,
            ExportFormat::Pptx,
            ExportFormat::PdfSearchable,
            ExportFormat::PdfTextAndImages,
            ExportFormat::PdfA,
            ExportFormat::Xml,
            ExportFormat::XmlForCorrectedImage,
            ExportFormat::Alto,
        ];
        all.into_iter().find(|f| f.as_str().eq_ignore_ascii_case(s))
    }

    fn is_pdf(&self) -> bool {
        matches!(
            self,
            ExportFormat::PdfSearchable | ExportFormat::PdfTextAndImages | ExportFormat::PdfA
        )
    }

    fn is_xml(&self) -> bool {
        matches!(self, ExportFormat::Xml | ExportFormat::XmlForCorrectedImage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingProfile {
    DocumentConversion,
    DocumentArchiving,
    TextExtraction,
    BarcodeRecognition,
}

impl ProcessingProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingProfile::DocumentConversion => "documentConversion",
            ProcessingProfile::DocumentArchiving => "documentArchiving",
            ProcessingProfile::TextExtraction => "textExtraction",
            ProcessingProfile::BarcodeRecognition => "barcodeRecognition",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    Normal,
    Typewriter,
    Matrix,
    Index,
    OcrA,
    OcrB,
    E13b,
    Cmc7,
    Gothic,
}

impl TextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Normal => "normal",
            TextType::Typewriter => "typewriter",
            TextType::Matrix => "matrix",
            TextType::Index => "index",
            TextType::OcrA => "ocrA",
            TextType::OcrB => "ocrB",
            TextType::E13b => "e13b",
            TextType::Cmc7 => "cmc7",
            TextType::Gothic => "gothic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Auto,
    Photo,
    Scanner,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Auto => "auto",
            ImageSource::Photo => "photo",
            ImageSource::Scanner => "scanner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTags {
    Auto,
    Write,
    DontWrite,
}

impl WriteTags {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteTags::Auto => "auto",
            WriteTags::Write => "write",
            WriteTags::DontWrite => "dontWrite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckmarkType {
    Empty,
    Square,
    Circle,
}

impl CheckmarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckmarkType::Empty => "empty",
            CheckmarkType::Square => "square",
            CheckmarkType::Circle => "circle",
        }
    }
}

fn push_opt(pairs: &mut Vec<(String, String)>, key: &str, value: Option<impl ToString>) {
    if let Some(v) = value {
        pairs.push((key.to_string(), v.to_string()));
    }
}

fn check_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(Error::validation_with_context(
            format!("description exceeds {} characters", MAX_DESCRIPTION_LEN),
            ErrorContext::new().with_field_path("params.description"),
        )),
        _ => Ok(()),
    }
}

/// Options for full-page image recognition. Unset fields use the service defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageProcessingParams {
    pub pdf_password: Option<String>,
    pub description: Option<String>,
    pub export_formats: Vec<ExportFormat>,
    pub profile: Option<ProcessingProfile>,
    pub text_types: Vec<TextType>,
    pub image_source: Option<ImageSource>,
    pub correct_orientation: Option<bool>,
    pub correct_skew: Option<bool>,
    /// Comma-separated recognition languages, e.g. "English,French".
    pub language: Option<String>,
    /// Only meaningful with a PDF export format.
    pub write_tags: Option<WriteTags>,
    /// Only meaningful with an XML export format.
    pub write_recognition_variants: Option<bool>,
    /// Only meaningful with an XML export format.
    pub write_formatting: Option<bool>,
    pub read_barcodes: Option<bool>,
}

impl ImageProcessingParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export_formats(mut self, formats: impl IntoIterator<Item = ExportFormat>) -> Self {
        self.export_formats = formats.into_iter().collect();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn profile(mut self, profile: ProcessingProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ProcessingParams for ImageProcessingParams {
    fn endpoint(&self) -> &'static str {
        "v2/processImage"
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.export_formats.is_empty() {
            let joined: Vec<&str> = self.export_formats.iter().map(|f| f.as_str()).collect();
            pairs.push(("exportFormat".to_string(), joined.join(",")));
        }
        push_opt(&mut pairs, "profile", self.profile.map(|p| p.as_str()));
        if !self.text_types.is_empty() {
            let joined: Vec<&str> = self.text_types.iter().map(|t| t.as_str()).collect();
            pairs.push(("textType".to_string(), joined.join(",")));
        }
        push_opt(&mut pairs, "imageSource", self.image_source.map(|s| s.as_str()));
        push_opt(&mut pairs, "correctOrientation", self.correct_orientation);
        push_opt(&mut pairs, "correctSkew", self.correct_skew);
        push_opt(&mut pairs, "language", self.language.as_deref());
        push_opt(&mut pairs, "pdf:writeTags", self.write_tags.map(|w| w.as_str()));
        push_opt(
            &mut pairs,
            "xml:writeRecognitionVariants",
            self.write_recognition_variants,
        );
        push_opt(&mut pairs, "xml:writeFormatting", self.write_formatting);
        push_opt(&mut pairs, "readBarcodes", self.read_barcodes);
        push_opt(&mut pairs, "pdfPassword", self.pdf_password.as_deref());
        push_opt(&mut pairs, "description", self.description.as_deref());
        pairs
    }

    fn validate(&self) -> Result<()> {
        check_description(self.description.as_deref())?;
        if self.write_tags.is_some() && !self.export_formats.iter().any(|f| f.is_pdf()) {
            return Err(Error::validation_with_context(
                "pdf:writeTags requires a PDF export format",
                ErrorContext::new().with_field_path("params.write_tags"),
            ));
        }
        let wants_xml_options =
            self.write_recognition_variants.is_some() || self.write_formatting.is_some();
        if wants_xml_options && !self.export_formats.iter().any(|f| f.is_xml()) {
            return Err(Error::validation_with_context(
                "xml:* options require an XML export format",
                ErrorContext::new().with_field_path("params.export_formats"),
            ));
        }
        Ok(())
    }
}

/// Options for recognising a single checkmark field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckmarkFieldProcessingParams {
    pub pdf_password: Option<String>,
    pub description: Option<String>,
    /// "left,top,right,bottom" in pixels; "-1,-1,-1,-1" means the whole image.
    pub region: Option<String>,
    pub checkmark_type: Option<CheckmarkType>,
    pub correction_allowed: Option<bool>,
}

impl ProcessingParams for CheckmarkFieldProcessingParams {
    fn endpoint(&self) -> &'static str {
        "v2/processCheckmarkField"
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "region", self.region.as_deref());
        push_opt(&mut pairs, "checkmarkType", self.checkmark_type.map(|c| c.as_str()));
        push_opt(&mut pairs, "correctionAllowed", self.correction_allowed);
        push_opt(&mut pairs, "pdfPassword", self.pdf_password.as_deref());
        push_opt(&mut pairs, "description", self.description.as_deref());
        pairs
    }

    fn validate(&self) -> Result<()> {
        check_description(self.description.as_deref())?;
        if let Some(region) = &self.region {
            let ok = region
                .split(',')
                .map(|p| p.trim().parse::<i64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(|v| v.len() == 4)
                .unwrap_or(false);
            if !ok {
                return Err(Error::validation_with_context(
                    format!("region must be four comma-separated integers, got {:?}", region),
                    ErrorContext::new().with_field_path("params.region"),
                ));
            }
        }
        Ok(())
    }
}
