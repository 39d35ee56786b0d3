use std::panic::{self, AssertUnwindSafe};

use uuid::Uuid;

use super::context::{build_context, ContextSource};
use super::enrich::enrich;
use super::gemini::GeminiClient;
use super::parser::{enforce_completeness, parse_model_response};
use super::prompt::build_analysis_prompt;
use super::types::{GenerationRequest, InlineImage, LlmClient};
use super::AnalysisError;
use crate::config::AnalyzerConfig;
use crate::models::{AssessmentResult, EnrichedResult, HealthInput};
use crate::pipeline::extraction::{default_ocr_engine, ImageTextExtractor, OcrEngine};

/// Drives one request through the whole pipeline:
/// extract → context → prompt → model → parse → enrich
///
/// Holds only read-only configuration and clients; share it behind `Arc`.
pub struct HealthAnalyzer {
    config: AnalyzerConfig,
    llm: Box<dyn LlmClient + Send + Sync>,
    extractor: ImageTextExtractor,
}

/// Intermediate state of one run, kept so enrichment sees the OCR text even
/// when a later stage failed.
#[derive(Default)]
struct RunTrace {
    ocr_text: Option<String>,
}

impl HealthAnalyzer {
    pub fn new(
        config: AnalyzerConfig,
        llm: Box<dyn LlmClient + Send + Sync>,
        ocr: Box<dyn OcrEngine + Send + Sync>,
    ) -> Self {
        Self {
            config,
            llm,
            extractor: ImageTextExtractor::new(ocr),
        }
    }

    /// Build the production analyzer: Gemini over HTTP plus the OCR engine
    /// this build was compiled with.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let llm = GeminiClient::new(&config)?;
        let ocr = default_ocr_engine(config.tessdata_dir.as_deref())?;
        Ok(Self::new(config, Box::new(llm), ocr))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one request. Always returns one of the three outcome shapes
    /// with `developer_info` attached; no failure escapes.
    pub fn analyze(&self, input: &HealthInput) -> EnrichedResult {
        let request_id = Uuid::new_v4();
        let mode = input.mode();
        let span = tracing::info_span!(
            "analyze",
            request_id = %request_id,
            input_mode = %mode,
        );
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let mut trace = RunTrace::default();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(input, &mut trace)))
            .unwrap_or_else(|payload| {
                let detail = panic_detail(payload.as_ref());
                tracing::error!(detail = %detail, "Analysis panicked");
                Err(AnalysisError::Internal(detail))
            });

        let assessment = match outcome {
            Ok(assessment) => {
                tracing::info!(
                    status = assessment.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Analysis complete"
                );
                assessment
            }
            Err(e) => {
                tracing::warn!(
                    kind = e.kind(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Analysis failed"
                );
                e.into_assessment()
            }
        };

        enrich(assessment, mode, trace.ocr_text)
    }

    fn run(
        &self,
        input: &HealthInput,
        trace: &mut RunTrace,
    ) -> Result<AssessmentResult, AnalysisError> {
        if !self.config.has_api_key() {
            return Err(AnalysisError::Configuration);
        }

        let (context, image) = match input {
            HealthInput::Image(bytes) => {
                if bytes.is_empty() {
                    return Err(AnalysisError::NoInput);
                }
                let extracted = self.extractor.extract_text(bytes)?;
                let context = build_context(ContextSource::Ocr(&extracted.text))?;
                trace.ocr_text = Some(extracted.text);

                let image = self
                    .config
                    .attach_image
                    .then(|| InlineImage::png(extracted.image.png_bytes));
                (context, image)
            }
            HealthInput::Manual(record) => (build_context(ContextSource::Manual(record))?, None),
        };

        let prompt = build_analysis_prompt(&context);
        tracing::debug!(
            prompt_chars = prompt.len(),
            image_attached = image.is_some(),
            model = self.llm.model_name(),
            "Invoking model"
        );

        let request = GenerationRequest::new(prompt).with_image(image);
        let response = self.llm.generate(&request)?;
        tracing::debug!(response_chars = response.len(), "Model responded");

        let parsed = parse_model_response(&response)?;
        Ok(if self.config.enforce_completeness {
            enforce_completeness(parsed)
        } else {
            parsed.assessment
        })
    }
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
