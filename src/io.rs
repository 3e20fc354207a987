use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{IoError, SurrogateError, SurrogateResult};

/// Default buffer size of file readers and writers (128 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

// ================================================================================================
// Serde Formats
// ================================================================================================

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Eq,
    Hash,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    IntoStaticStr,
    Default,
)]
#[strum(serialize_all = "lowercase")]
pub enum SerdeFormat {
    /// Compact binary encoding.
    #[default]
    Postcard,
    /// Human-readable, pretty-printed JSON.
    Json,
}

impl SerdeFormat {
    /// Picks the format from the file extension (`.postcard` or `.json`).
    pub fn from_path(path: impl AsRef<Path>) -> SurrogateResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| err(&path.display().to_string(), true))?;

        match ext.to_lowercase().as_str() {
            "postcard" => Ok(Self::Postcard),
            "json" => Ok(Self::Json),
            other => Err(err(other, false)),
        }
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> SurrogateResult<Vec<u8>> {
        let bytes = match self {
            Self::Postcard => postcard::to_stdvec(value).map_err(IoError::Encoding)?,
            Self::Json => serde_json::to_vec_pretty(value).map_err(IoError::Json)?,
        };
        Ok(bytes)
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> SurrogateResult<T> {
        let value = match self {
            Self::Postcard => postcard::from_bytes(bytes).map_err(IoError::Encoding)?,
            Self::Json => serde_json::from_slice(bytes).map_err(IoError::Json)?,
        };
        Ok(value)
    }
}

fn err(s: &str, missing_extension: bool) -> SurrogateError {
    let msg = if missing_extension {
        format!("missing or invalid extension in path '{s}'")
    } else {
        format!("'{s}'")
    };
    IoError::UnsupportedFormat(msg).into()
}

// ================================================================================================
// File Helpers
// ================================================================================================

/// Serializes `value` into a new file at `path`, replacing any existing file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), format = %format))]
pub fn write<T: Serialize>(
    value: &T,
    path: impl AsRef<Path>,
    format: SerdeFormat,
) -> SurrogateResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    let file = File::create(path).map_err(IoError::Io)?;
    let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

    match format {
        SerdeFormat::Postcard => {
            postcard::to_io(value, &mut writer).map_err(IoError::Encoding)?;
        }
        SerdeFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, value).map_err(IoError::Json)?;
        }
    }
    writer.flush().map_err(IoError::Io)?;

    tracing::info!("Successfully wrote file");
    Ok(())
}

/// Reads a value written by [`write`] with the same `format`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), format = %format))]
pub fn read<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    format: SerdeFormat,
) -> SurrogateResult<T> {
    let file = File::open(path.as_ref()).map_err(IoError::Io)?;
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);

    let mut data = Vec::new();
    reader.read_to_end(&mut data).map_err(IoError::Io)?;

    let value = format.decode(&data)?;
    tracing::info!(bytes = data.len(), "Successfully loaded file");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("epi-surrogate-io-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SerdeFormat::from_path("out/scaler.postcard").unwrap(),
            SerdeFormat::Postcard
        );
        assert_eq!(
            SerdeFormat::from_path("scaler.JSON").unwrap(),
            SerdeFormat::Json
        );
        assert!(SerdeFormat::from_path("scaler.csv").is_err());
        assert!(SerdeFormat::from_path("scaler").is_err());
    }

    #[test]
    fn display_matches_extension() {
        assert_eq!(SerdeFormat::Postcard.to_string(), "postcard");
        assert_eq!(SerdeFormat::Json.to_string(), "json");
    }

    #[test]
    fn bytes_round_trip_in_both_formats() {
        let value = BTreeMap::from([("a".to_string(), 1.5), ("b".to_string(), -2.0)]);
        for format in [SerdeFormat::Postcard, SerdeFormat::Json] {
            let bytes = format.encode(&value).unwrap();
            let back: BTreeMap<String, f64> = format.decode(&bytes).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn file_round_trip_creates_parent_directories() {
        let value = vec![1.0, 2.0, 3.0];
        for format in [SerdeFormat::Postcard, SerdeFormat::Json] {
            let path = temp_path(&format!("nested/values.{format}"));
            write(&value, &path, format).unwrap();
            let back: Vec<f64> = read(&path, format).unwrap();
            assert_eq!(back, value);
            std::fs::remove_file(&path).unwrap();
        }
    }

    #[test]
    fn reading_missing_file_fails() {
        let result: SurrogateResult<Vec<f64>> = read(temp_path("missing.json"), SerdeFormat::Json);
        assert!(matches!(result, Err(SurrogateError::Io(IoError::Io(_)))));
    }
}
