use crate::error::IngestError;
use crate::models::Chunk;

/// Lazy sliding window over one text. The iterator is finite and pure:
/// chunking the same input twice yields identical spans.
#[derive(Debug, Clone)]
pub struct Chunks {
    chars: Vec<char>,
    size: usize,
    stride: usize,
    cursor: usize,
    index: u64,
    done: bool,
}

/// Splits `text` into windows of `size` chars advancing by `size - overlap`.
/// The final chunk may be shorter than `size`; empty input yields an empty
/// sequence.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Chunks, IngestError> {
    if size == 0 {
        return Err(IngestError::Config(
            "chunk size must be positive".to_string(),
        ));
    }
    if overlap >= size {
        return Err(IngestError::Config(format!(
            "chunk overlap {overlap} must be smaller than chunk size {size}"
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    Ok(Chunks {
        done: chars.is_empty(),
        chars,
        size,
        stride: size - overlap,
        cursor: 0,
        index: 0,
    })
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done || self.cursor >= self.chars.len() {
            return None;
        }

        let start = self.cursor;
        let end = (start + self.size).min(self.chars.len());
        let chunk = Chunk {
            index: self.index,
            start_char: start,
            end_char: end,
            text: self.chars[start..end].iter().collect(),
        };

        self.index += 1;
        if end == self.chars.len() {
            // a window ending exactly at the text end must not be followed by
            // an overlap-only tail
            self.done = true;
        } else {
            self.cursor += self.stride;
        }

        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_size_and_oversized_overlap() {
        assert!(matches!(chunk("abc", 0, 0), Err(IngestError::Config(_))));
        assert!(matches!(chunk("abc", 4, 4), Err(IngestError::Config(_))));
        assert!(matches!(chunk("abc", 4, 9), Err(IngestError::Config(_))));
    }

    #[test]
    fn empty_text_yields_empty_sequence() {
        let chunks: Vec<Chunk> = chunk("", 10, 2).unwrap().collect();
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks: Vec<Chunk> = chunk("abc", 10, 2).unwrap().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "abc");
        assert_eq!((chunks[0].start_char, chunks[0].end_char), (0, 3));
    }

    #[test]
    fn window_offsets_match_configured_stride() {
        let text: String = std::iter::repeat('x').take(1200).collect();
        let chunks: Vec<Chunk> = chunk(&text, 500, 50).unwrap().collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!((chunks[0].start_char, chunks[0].end_char), (0, 500));
        assert_eq!((chunks[1].start_char, chunks[1].end_char), (450, 950));
        assert_eq!((chunks[2].start_char, chunks[2].end_char), (900, 1200));
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn chunking_is_restartable() {
        let text = "The quick brown fox jumps over the lazy dog, twice over.";
        let first: Vec<Chunk> = chunk(text, 16, 5).unwrap().collect();
        let second: Vec<Chunk> = chunk(text, 16, 5).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn concatenation_with_overlaps_removed_reconstructs_input() {
        for (size, overlap) in [(500, 50), (16, 5), (7, 0), (9, 8)] {
            let text = "Chunk boundaries must never lose or duplicate characters \
                        when the overlap is stripped back out of each window.";
            let chunks: Vec<Chunk> = chunk(text, size, overlap).unwrap().collect();

            let mut rebuilt = String::new();
            for (position, piece) in chunks.iter().enumerate() {
                if position == 0 {
                    rebuilt.push_str(&piece.text);
                } else {
                    rebuilt.extend(piece.text.chars().skip(overlap));
                }
            }

            assert_eq!(rebuilt, text, "size={size} overlap={overlap}");
        }
    }

    #[test]
    fn chunk_length_never_exceeds_size() {
        let text: String = std::iter::repeat('y').take(731).collect();
        for piece in chunk(&text, 100, 30).unwrap() {
            assert!(piece.text.chars().count() <= 100);
        }
    }
}
