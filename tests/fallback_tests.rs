// tests for fallback reply selection

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use haymart_ai::{FALLBACK_MESSAGES, Fallback, Picker};

struct Fixed(usize);

impl Picker for Fixed {
    fn pick(&self, _len: usize) -> usize {
        self.0
    }
}

struct RoundRobin(AtomicUsize);

impl Picker for RoundRobin {
    fn pick(&self, len: usize) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) % len
    }
}

#[test]
fn test_pool_has_four_messages() {
    let unique: HashSet<_> = FALLBACK_MESSAGES.iter().collect();
    assert_eq!(unique.len(), 4);
}

#[test]
fn test_fixed_picker_is_deterministic() {
    let fallback = Fallback::new(Arc::new(Fixed(2)));
    assert_eq!(fallback.pick(), FALLBACK_MESSAGES[2]);
    assert_eq!(fallback.pick(), FALLBACK_MESSAGES[2]);
}

#[test]
fn test_out_of_range_picker_wraps() {
    let fallback = Fallback::new(Arc::new(Fixed(6)));
    assert_eq!(fallback.pick(), FALLBACK_MESSAGES[2]);
}

#[test]
fn test_picker_drives_selection() {
    let fallback = Fallback::new(Arc::new(RoundRobin(AtomicUsize::new(0))));
    let picked: Vec<&str> = (0..4).map(|_| fallback.pick()).collect();
    assert_eq!(picked, FALLBACK_MESSAGES);
}

#[test]
fn test_default_picks_from_pool() {
    let fallback = Fallback::default();
    for _ in 0..50 {
        assert!(Fallback::is_fallback(fallback.pick()));
    }
}

#[test]
fn test_concurrent_picks() {
    let fallback = Fallback::default();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fallback = fallback.clone();
            std::thread::spawn(move || (0..100).all(|_| Fallback::is_fallback(fallback.pick())))
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap());
    }
}
