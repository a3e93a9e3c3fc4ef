//! Word Source Adapter: where secret words come from.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::AdapterError;

/// A candidate secret word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    /// 1 = easy, higher is harder.
    pub difficulty: u8,
    pub category: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, difficulty: u8, category: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            difficulty,
            category: category.into(),
        }
    }
}

/// Supplies random words.
///
/// Implementations may hit a database or a remote service and may fail.
/// The room calls this from a background task, never from its own loop.
pub trait WordSource: Send + Sync + 'static {
    /// Returns a random word.
    ///
    /// # Errors
    /// Returns [`AdapterError::WordSource`] when no word can be produced.
    fn random_word(&self) -> impl Future<Output = Result<WordEntry, AdapterError>> + Send;
}

/// Seed catalogue used when nothing else is configured.
const SEED_WORDS: &[(&str, u8, &str)] = &[
    ("chat", 1, "animaux"),
    ("chien", 1, "animaux"),
    ("maison", 1, "objets"),
    ("voiture", 2, "objets"),
    ("soleil", 1, "nature"),
    ("lune", 1, "nature"),
    ("ordinateur", 2, "technologie"),
    ("téléphone", 2, "technologie"),
];

/// Last-resort words when every source has failed.
const FALLBACK_WORDS: &[(&str, u8, &str)] = &[
    ("chat", 1, "animaux"),
    ("maison", 1, "objets"),
    ("voiture", 2, "objets"),
];

fn pick(table: &[(&str, u8, &str)]) -> Option<WordEntry> {
    if table.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..table.len());
    let (word, difficulty, category) = table[idx];
    Some(WordEntry::new(word, difficulty, category))
}

/// A random word from the built-in fallback list. Never fails.
pub fn fallback_word() -> WordEntry {
    pick(FALLBACK_WORDS).unwrap_or_else(|| WordEntry::new("chat", 1, "animaux"))
}

/// An in-memory word list with uniform random picks.
#[derive(Debug, Clone, Default)]
pub struct StaticWordList {
    entries: Vec<WordEntry>,
}

impl StaticWordList {
    pub fn new(entries: Vec<WordEntry>) -> Self {
        Self { entries }
    }

    /// The seed catalogue.
    pub fn seeded() -> Self {
        Self::new(
            SEED_WORDS
                .iter()
                .map(|&(w, d, c)| WordEntry::new(w, d, c))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl WordSource for StaticWordList {
    async fn random_word(&self) -> Result<WordEntry, AdapterError> {
        if self.entries.is_empty() {
            return Err(AdapterError::WordSource("word list is empty".into()));
        }
        let idx = rand::rng().random_range(0..self.entries.len());
        Ok(self.entries[idx].clone())
    }
}

/// Wraps a source and falls back to the built-in list when it fails.
#[derive(Debug, Clone)]
pub struct FallbackWordSource<W> {
    primary: W,
}

impl<W: WordSource> FallbackWordSource<W> {
    pub fn new(primary: W) -> Self {
        Self { primary }
    }
}

impl<W: WordSource> WordSource for FallbackWordSource<W> {
    async fn random_word(&self) -> Result<WordEntry, AdapterError> {
        match self.primary.random_word().await {
            Ok(entry) => Ok(entry),
            Err(e) => {
                tracing::warn!(error = %e, "word source failed, using fallback list");
                Ok(fallback_word())
            }
        }
    }
}

/// Fetches a word, retrying once before falling back to the built-in list.
///
/// Each attempt is bounded by `timeout`; an attempt that runs over counts
/// as a failure.
pub async fn fetch_word<W: WordSource>(source: &W, timeout: Duration) -> WordEntry {
    for attempt in 1..=2u8 {
        match tokio::time::timeout(timeout, source.random_word()).await {
            Ok(Ok(entry)) => return entry,
            Ok(Err(e)) => tracing::warn!(attempt, error = %e, "word fetch failed"),
            Err(_) => tracing::warn!(
                attempt,
                timeout_ms = timeout.as_millis() as u64,
                "word fetch timed out"
            ),
        }
    }
    fallback_word()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then yields "soleil".
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl WordSource for Flaky {
        async fn random_word(&self) -> Result<WordEntry, AdapterError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(AdapterError::WordSource("unreachable".into()))
            } else {
                Ok(WordEntry::new("soleil", 1, "nature"))
            }
        }
    }

    /// Never answers.
    struct Hanging {
        calls: AtomicU32,
    }

    impl WordSource for Hanging {
        async fn random_word(&self) -> Result<WordEntry, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn is_fallback(entry: &WordEntry) -> bool {
        FALLBACK_WORDS.iter().any(|(w, _, _)| *w == entry.word)
    }

    #[tokio::test]
    async fn test_static_list_picks_from_entries() {
        let list = StaticWordList::new(vec![WordEntry::new("lune", 1, "nature")]);
        assert_eq!(list.random_word().await.unwrap().word, "lune");
    }

    #[tokio::test]
    async fn test_static_list_empty_is_error() {
        let list = StaticWordList::default();
        assert!(matches!(
            list.random_word().await,
            Err(AdapterError::WordSource(_))
        ));
    }

    #[test]
    fn test_seeded_catalogue_has_seed_words() {
        let list = StaticWordList::seeded();
        assert_eq!(list.len(), 8);
        assert!(list.entries.iter().any(|e| e.word == "téléphone"));
    }

    #[tokio::test]
    async fn test_fallback_source_survives_empty_primary() {
        let source = FallbackWordSource::new(StaticWordList::default());
        let entry = source.random_word().await.unwrap();
        assert!(is_fallback(&entry));
    }

    #[tokio::test]
    async fn test_fetch_word_retries_once() {
        let source = Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
        };
        let entry = fetch_word(&source, TIMEOUT).await;
        assert_eq!(entry.word, "soleil");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_word_falls_back_after_two_failures() {
        let source = Flaky {
            failures: 5,
            calls: AtomicU32::new(0),
        };
        let entry = fetch_word(&source, TIMEOUT).await;
        assert!(is_fallback(&entry));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_word_times_out_hanging_source() {
        let source = Hanging {
            calls: AtomicU32::new(0),
        };
        let started = tokio::time::Instant::now();
        let entry = fetch_word(&source, TIMEOUT).await;
        assert!(is_fallback(&entry));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), TIMEOUT * 2);
    }

    #[test]
    fn test_fallback_list_has_at_least_three_words() {
        assert!(FALLBACK_WORDS.len() >= 3);
    }
}
