use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use rand::{seq::SliceRandom, Rng};

use crate::Result;

/// Read a corpus file as a list of lines, newlines stripped.
/// Content is not validated against the alphabet here; out-of-alphabet
/// characters surface later as encode errors.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    Ok(lines)
}

/// Shuffle the corpus lines and chunk them into batches.
/// Called once per epoch so every epoch sees a fresh order.
pub fn shuffled_batches<'a, R: Rng>(
    lines: &'a [String],
    batch_size: usize,
    rng: &mut R,
) -> Vec<Vec<&'a str>> {
    let mut order: Vec<&str> = lines.iter().map(String::as_str).collect();
    order.shuffle(rng);
    order.chunks(batch_size).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn batches_preserve_every_line() {
        let lines: Vec<String> = (0..100).map(|i| format!("line {}", i)).collect();
        let mut rng = rand::thread_rng();

        let batches = shuffled_batches(&lines, 32, &mut rng);
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0].len(), 32);
        assert_eq!(batches[3].len(), 4);

        let mut seen: Vec<&str> = batches.into_iter().flatten().collect();
        seen.sort();
        let mut expected: Vec<&str> = lines.iter().map(String::as_str).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn loads_lines_without_newlines() {
        let path = std::env::temp_dir().join(format!("scrawl-corpus-{}.txt", std::process::id()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Who is there?").unwrap();
        writeln!(file, "Nay, answer me.").unwrap();

        let lines = load_lines(&path).unwrap();
        assert_eq!(lines, vec!["Who is there?", "Nay, answer me."]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_lines(Path::new("no-such-corpus.txt")).is_err());
    }
}
