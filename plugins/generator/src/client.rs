//! Generation client: prompt in, delimited site out

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use webcraft_core::{GeneratorConfig, HandoffStore, Result, WebcraftError};

use crate::backend::{GenerationRequest, TextGenerator};
use crate::preview::compose_preview_document;
use crate::prompt::{build_instruction, enhance_prompt};
use crate::response::{parse_generated_text, GeneratedSite};

/// Clears the in-flight flag when a generation ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct GenerationClient {
    backend: Arc<dyn TextGenerator>,
    config: GeneratorConfig,
    in_flight: AtomicBool,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn TextGenerator>, config: GeneratorConfig) -> Self {
        Self {
            backend,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a generation is currently running
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeneratedSite> {
        if prompt.trim().is_empty() {
            return Err(WebcraftError::validation("Please describe the website to generate"));
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WebcraftError::validation(
                "A website is already being generated. Please wait for it to finish.",
            ));
        }
        let _guard = InFlight(&self.in_flight);

        let enhanced = enhance_prompt(prompt);
        info!("Generating website for prompt ({} chars enhanced)", enhanced.len());
        let request = GenerationRequest::new(build_instruction(&enhanced), &self.config);

        let result = async {
            let text = self.backend.generate_text(&request).await?;
            parse_generated_text(&text)
        }
        .await;

        match &result {
            Ok(site) => info!(
                "Generated {} bytes of HTML, {} of CSS, {} of JS",
                site.html.len(),
                site.css.len(),
                site.js.len()
            ),
            Err(e) => error!("Website generation failed: {}", e),
        }
        result
    }

    /// Generate and hand the site over to the editor: the parts and the
    /// composed preview document go into `handoff`
    pub async fn generate_into(
        &self,
        prompt: &str,
        handoff: &HandoffStore,
        style_framework_url: &str,
    ) -> Result<(GeneratedSite, String)> {
        let site = self.generate(prompt).await?;
        let document = compose_preview_document(&site, style_framework_url);
        handoff
            .store_generated(&site.html, &site.css, &site.js, &document)
            .await?;
        Ok((site, document))
    }
}
