#![recursion_limit = "256"]

pub mod alphabet;
pub mod corpus;
pub mod model;
pub mod sample;
pub mod train;

pub use alphabet::{decode, encode, CharId, ALPHABET_SIZE};
pub use sample::generate;
pub use train::train;

#[derive(Clone, Copy, Debug, Default)]
pub enum Backend {
    #[default]
    Wgpu,
    Cpu,
}

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Alphabet(String),
    Sampling(String),
    Signal(String),
    Burn(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{}", e),
            Error::Alphabet(s) => write!(f, "{}", s),
            Error::Sampling(s) => write!(f, "{}", s),
            Error::Signal(s) => write!(f, "{}", s),
            Error::Burn(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_their_message() {
        let err = Error::Signal("could not install interrupt handler".to_string());
        assert_eq!(err.to_string(), "could not install interrupt handler");

        let err = Error::Alphabet("bad id".to_string());
        assert_eq!(err.to_string(), "bad id");
    }
}
