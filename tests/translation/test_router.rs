// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Direct and pivot routing through the model cache

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ocr_translate_node::translation::{
    MarianOnnxProvider, ModelLoadError, TranslationModel, TranslationModelProvider,
};
use ocr_translate_node::{LanguagePair, TranslationError, TranslationRouter};

use crate::common::{FakeProvider, Tagger};

/// Takes `delay` to load the `slow` pair and signals when that load starts
struct SlowProvider {
    slow: LanguagePair,
    delay: Duration,
    started: Mutex<Option<mpsc::Sender<()>>>,
    loads: AtomicUsize,
}

impl SlowProvider {
    fn new(slow: LanguagePair, delay: Duration) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        let provider = Self {
            slow,
            delay,
            started: Mutex::new(Some(tx)),
            loads: AtomicUsize::new(0),
        };
        (provider, rx)
    }
}

impl TranslationModelProvider for SlowProvider {
    fn load(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslationModel>, ModelLoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if *pair == self.slow {
            if let Some(tx) = self.started.lock().unwrap().take() {
                tx.send(()).unwrap();
            }
            thread::sleep(self.delay);
        }
        Ok(Arc::new(Tagger(pair.clone())))
    }
}

#[test]
fn test_identity_route_for_any_text() {
    let provider = Arc::new(FakeProvider::default());
    let router = TranslationRouter::new(provider.clone(), 4, "en");
    for text in ["Hello", "multi\nline text", "  padded  "] {
        assert_eq!(router.translate(text, "en", "en").unwrap(), text);
    }
    assert_eq!(provider.total_loads(), 0);
}

#[test]
fn test_empty_text_for_any_pair() {
    let provider = Arc::new(FakeProvider::default());
    let router = TranslationRouter::new(provider.clone(), 4, "en");
    assert_eq!(router.translate("", "fr", "ja").unwrap(), "");
    assert_eq!(router.translate("", "xx", "yy").unwrap(), "");
    assert_eq!(provider.total_loads(), 0);
}

#[test]
fn test_pivot_returns_second_hop_output() {
    let provider = Arc::new(FakeProvider::with(&[("fr", "en"), ("en", "ja")]));
    let router = TranslationRouter::new(provider.clone(), 4, "en");

    let out = router.translate("bonjour", "fr", "ja").unwrap();
    assert_eq!(out, "bonjour[fr>en][en>ja]");
    assert_eq!(provider.loads_of("fr", "ja"), 1);
    assert_eq!(provider.loads_of("fr", "en"), 1);
    assert_eq!(provider.loads_of("en", "ja"), 1);
}

#[test]
fn test_direct_route_preferred() {
    let provider = Arc::new(FakeProvider::with(&[("fr", "ja"), ("fr", "en"), ("en", "ja")]));
    let router = TranslationRouter::new(provider.clone(), 4, "en");
    assert_eq!(router.translate("bonjour", "fr", "ja").unwrap(), "bonjour[fr>ja]");
    assert_eq!(provider.loads_of("fr", "en"), 0);
}

#[test]
fn test_missing_pair_named_in_error() {
    let router = TranslationRouter::new(Arc::new(FakeProvider::with(&[("en", "ja")])), 4, "en");
    let err = router.translate("bonjour", "fr", "ja").unwrap_err();
    assert_eq!(
        err,
        TranslationError::NotSupported {
            from: "fr".to_string(),
            to: "ja".to_string(),
            missing: LanguagePair::new("fr", "en"),
        }
    );
}

#[test]
fn test_missing_pairs_not_reloaded() {
    let provider = Arc::new(FakeProvider::default());
    let router = TranslationRouter::new(provider.clone(), 4, "en");
    for _ in 0..3 {
        assert!(router.translate("hello", "en", "ko").is_err());
    }
    assert_eq!(provider.loads_of("en", "ko"), 1);
}

#[test]
fn test_cache_bounded() {
    let provider = Arc::new(FakeProvider::with(&[
        ("fr", "en"),
        ("de", "en"),
        ("es", "en"),
        ("it", "en"),
    ]));
    let router = TranslationRouter::new(provider.clone(), 2, "en");
    for source in ["fr", "de", "es", "it"] {
        router.translate("x", source, "en").unwrap();
    }
    let cached = router.cached_pairs();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[0], LanguagePair::new("it", "en"));
}

#[test]
fn test_concurrent_requests_load_once() {
    let provider = Arc::new(FakeProvider::with(&[("fr", "en")]));
    let router = Arc::new(TranslationRouter::new(provider.clone(), 4, "en"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let router = router.clone();
            thread::spawn(move || router.translate(&format!("mot {i}"), "fr", "en"))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
    assert_eq!(provider.loads_of("fr", "en"), 1);
}

#[test]
fn test_cached_pair_not_blocked_by_another_load() {
    let (provider, started) =
        SlowProvider::new(LanguagePair::new("de", "en"), Duration::from_millis(1500));
    let router = Arc::new(TranslationRouter::new(Arc::new(provider), 4, "en"));
    router.translate("bonjour", "fr", "en").unwrap();

    let background = {
        let router = router.clone();
        thread::spawn(move || router.translate("hallo", "de", "en"))
    };
    started.recv_timeout(Duration::from_secs(5)).unwrap();

    let begin = Instant::now();
    assert_eq!(router.translate("merci", "fr", "en").unwrap(), "merci[fr>en]");
    assert!(begin.elapsed() < Duration::from_millis(500));

    assert_eq!(background.join().unwrap().unwrap(), "hallo[de>en]");
}

#[test]
fn test_slow_load_shared_by_concurrent_callers() {
    let (provider, started) =
        SlowProvider::new(LanguagePair::new("fr", "en"), Duration::from_millis(300));
    let provider = Arc::new(provider);
    let router = Arc::new(TranslationRouter::new(provider.clone(), 4, "en"));

    let first = {
        let router = router.clone();
        thread::spawn(move || router.translate("un", "fr", "en"))
    };
    started.recv_timeout(Duration::from_secs(5)).unwrap();
    let others: Vec<_> = (0..4)
        .map(|i| {
            let router = router.clone();
            thread::spawn(move || router.translate(&format!("mot {i}"), "fr", "en"))
        })
        .collect();

    assert!(first.join().unwrap().is_ok());
    for handle in others {
        assert!(handle.join().unwrap().is_ok());
    }
    assert_eq!(provider.loads.load(Ordering::SeqCst), 1);
    assert_eq!(router.load_count(), 1);
}

#[test]
fn test_marian_provider_routes_missing_directories_to_not_supported() {
    let root = tempfile::tempdir().unwrap();
    let router = TranslationRouter::new(Arc::new(MarianOnnxProvider::new(root.path(), 64)), 4, "en");
    let err = router.translate("bonjour", "fr", "de").unwrap_err();
    assert!(matches!(err, TranslationError::NotSupported { .. }));
}

#[test]
#[ignore] // Requires exported opus-mt-fr-en under TRANSLATION_MODEL_DIR
fn test_real_marian_model() {
    let dir = std::env::var("TRANSLATION_MODEL_DIR")
        .unwrap_or_else(|_| "./models/translation".to_string());
    let router = TranslationRouter::new(Arc::new(MarianOnnxProvider::new(dir, 128)), 2, "en");
    let out = router.translate("Bonjour le monde", "fr", "en").unwrap();
    assert!(!out.is_empty());
}
