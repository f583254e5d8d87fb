// friendly replies for when a chat turn can't be completed

use std::sync::Arc;

use rand::Rng;

pub const FALLBACK_MESSAGES: [&str; 4] = [
    "⚠️ Maaf, sistem sedang mengalami kendala. Coba ulangi sebentar lagi ya.",
    "🤖 Hmm, sepertinya ada gangguan teknis. Aku akan coba membantumu lagi nanti.",
    "⚡ Wah, aku agak kesulitan memproses ini. Bisa dicoba lagi?",
    "🙏 Maaf banget, ada masalah di sistemku. Silakan ulangi pertanyaanmu.",
];

/// Source of indices into the fallback pool. Shared across requests.
pub trait Picker: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform choice from the thread-local rng.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl Picker for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

#[derive(Clone)]
pub struct Fallback {
    picker: Arc<dyn Picker>,
}

impl Default for Fallback {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRandom))
    }
}

impl Fallback {
    pub fn new(picker: Arc<dyn Picker>) -> Self {
        Self { picker }
    }

    pub fn pick(&self) -> &'static str {
        let i = self.picker.pick(FALLBACK_MESSAGES.len());
        FALLBACK_MESSAGES[i % FALLBACK_MESSAGES.len()]
    }

    pub fn is_fallback(text: &str) -> bool {
        FALLBACK_MESSAGES.contains(&text)
    }
}
