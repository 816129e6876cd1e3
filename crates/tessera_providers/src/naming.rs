//! Physical name generation.

/// Characters used for generated suffixes. Lowercase alphanumerics are valid
/// in container, Kubernetes object and ElastiCache cluster names alike.
const ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Length of the random suffix.
const SUFFIX_LEN: usize = 7;

/// Derives a physical name from a logical name by appending a random suffix.
///
/// Used when the caller does not name the backend object explicitly.
///
/// ```
/// let name = tessera_providers::physical_name("redis-container");
/// assert!(name.starts_with("redis-container-"));
/// assert_eq!(name.len(), "redis-container-".len() + 7);
/// ```
#[must_use]
pub fn physical_name(logical: &str) -> String {
    format!("{logical}-{}", nanoid::nanoid!(SUFFIX_LEN, &ALPHABET))
}
