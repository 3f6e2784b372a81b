//! Random test strings in the encodings each side of the boundary uses.

/// The strings a benchmark run sorts, kept in both managed (UTF-16) and native
/// (UTF-8) form.
pub struct Corpus {
    strings: Vec<String>,
    utf16: Vec<Vec<u16>>,
}

impl Corpus {
    /// Generates `count` random alphanumeric strings of `len` characters each.
    pub fn generate(count: usize, len: usize, seed: u64) -> Corpus {
        let mut rng = fastrand::Rng::with_seed(seed);
        let strings = (0..count)
            .map(|_| (0..len).map(|_| rng.alphanumeric()).collect::<String>())
            .collect();
        Corpus::from_strings(strings)
    }

    pub fn from_strings(strings: Vec<String>) -> Corpus {
        let utf16 = strings.iter().map(|s| s.encode_utf16().collect()).collect();
        Corpus { strings, utf16 }
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn utf16(&self) -> &[Vec<u16>] {
        &self.utf16
    }

    /// Total UTF-8 bytes across all strings.
    pub fn byte_len(&self) -> usize {
        self.strings.iter().map(String::len).sum()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let a = Corpus::generate(10, 16, 42);
        let b = Corpus::generate(10, 16, 42);
        assert_eq!(a.strings(), b.strings());
        assert_eq!(a.len(), 10);
        assert_eq!(a.byte_len(), 160);
        assert!(a.strings().iter().all(|s| s.chars().all(|c| c.is_ascii_alphanumeric())));
    }

    #[test]
    fn test_utf16_matches_strings() {
        let c = Corpus::from_strings(vec!["héllo".to_string()]);
        assert_eq!(String::from_utf16(&c.utf16()[0]).unwrap(), "héllo");
    }
}
