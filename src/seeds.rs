//! Built-in content that guarantees a playable round even when the provider
//! returns no tags or dense captions.

/// Generic joke captions mixed into every candidate pool.
pub const FALLBACK_CAPTIONS: [&str; 5] = [
  "Definitely a toaster.",
  "A dramatic potato in the wild.",
  "Two raccoons discussing taxes.",
  "A quantum cat both sitting and not sitting.",
  "A pizza delivering a human.",
];
