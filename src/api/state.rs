// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared handler state and the startup composition root

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::correction::{CandidateGenerator, LexicalCorrector, MaskedScorer, OnnxMaskedScorer};
use crate::pipeline::RecognitionOrchestrator;
use crate::translation::{LlmTranslator, MarianOnnxProvider, TranslationRouter};
use crate::vision::classifier::TextTypeClassifier;
use crate::vision::language::LanguageGuesser;
use crate::vision::model_manager::VisionModelManager;

/// Services shared by every request
///
/// Each handle is built once at startup; a `None` service answers 503.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RecognitionOrchestrator>,
    pub router: Option<Arc<TranslationRouter>>,
    pub llm: Option<Arc<LlmTranslator>>,
    /// Text-statistics guesser for translate requests
    pub language: Arc<LanguageGuesser>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Build every service the configuration points at
    ///
    /// Missing model files disable the matching service and are logged.
    pub fn load(config: &AppConfig) -> Self {
        let models = VisionModelManager::load(&config.models, &config.language);

        let mut orchestrator = RecognitionOrchestrator::new(
            models,
            TextTypeClassifier::new(config.classifier.clone()),
            LanguageGuesser::new(config.language.clone()),
            config.pipeline.clone(),
        );
        if let Some(corrector) = load_corrector(config) {
            orchestrator = orchestrator.with_corrector(Arc::new(corrector));
        }

        let router = config.models.translation_model_dir.as_ref().map(|dir| {
            if !dir.is_dir() {
                warn!(
                    "⚠️  Translation model directory not found: {} (mt translations will report unsupported pairs)",
                    dir.display()
                );
            }
            let provider = MarianOnnxProvider::new(dir, config.translation.max_new_tokens);
            let pairs = provider.available_pairs();
            info!("Translation pairs on disk: {}", pairs.len());
            Arc::new(TranslationRouter::new(
                Arc::new(provider),
                config.translation.cache_capacity,
                &config.translation.pivot_language,
            ))
        });

        let llm = match LlmTranslator::new(config.translation.llm.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("⚠️  LLM translator disabled: {}", e);
                None
            }
        };

        Self::from_parts(
            orchestrator,
            router,
            llm,
            LanguageGuesser::new(config.language.clone()),
            config.server.max_upload_bytes,
        )
    }

    pub fn from_parts(
        orchestrator: RecognitionOrchestrator,
        router: Option<Arc<TranslationRouter>>,
        llm: Option<Arc<LlmTranslator>>,
        language: LanguageGuesser,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            router,
            llm,
            language: Arc::new(language),
            max_upload_bytes,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ocr_ready", &self.orchestrator.is_ready())
            .field("router", &self.router.is_some())
            .field("llm", &self.llm.is_some())
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

/// Corrector from the vocabulary file plus the optional masked-LM scorer
pub fn load_corrector(config: &AppConfig) -> Option<LexicalCorrector> {
    let path = config.models.vocabulary_path.as_ref()?;
    if !path.exists() {
        warn!(
            "⚠️  Vocabulary not found at {}, correction disabled",
            path.display()
        );
        return None;
    }

    let generator = match CandidateGenerator::from_file(
        path,
        config.correction.length_window,
        config.correction.max_candidates,
    ) {
        Ok(g) => g,
        Err(e) => {
            warn!("⚠️  Failed to load vocabulary: {:#}", e);
            return None;
        }
    };

    let scorer = config
        .models
        .mlm_model_dir
        .as_ref()
        .and_then(|dir| match OnnxMaskedScorer::new(dir) {
            Ok(s) => {
                info!("✅ Masked-LM scorer loaded from {}", dir.display());
                Some(Arc::new(s) as Arc<dyn MaskedScorer>)
            }
            Err(e) => {
                warn!("⚠️  Masked-LM scorer not loaded: {:#}", e);
                None
            }
        });

    Some(LexicalCorrector::new(
        generator,
        scorer,
        config.correction.clone(),
    ))
}
