//! Category-set assets: six categories of five clues, validated once at load time.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::state::board::{CATEGORY_COUNT, CellPos, TIER_COUNT};

/// Failures while loading a category set.
#[derive(Debug, Error)]
pub enum AssetError {
    /// File could not be read.
    #[error("failed to read clue set `{path}`")]
    Read {
        /// Asset path.
        path: PathBuf,
        #[source]
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// File is not a mapping of categories to clue lists.
    #[error("failed to parse clue set `{path}`")]
    Parse {
        /// Asset path.
        path: PathBuf,
        #[source]
        /// Underlying parser failure.
        source: serde_yaml::Error,
    },
    /// Wrong number of categories.
    #[error("clue set `{path}` must have exactly {CATEGORY_COUNT} categories, found {found}")]
    Categories {
        /// Asset path.
        path: PathBuf,
        /// Categories found.
        found: usize,
    },
    /// A category with the wrong number of clues.
    #[error("category `{category}` in `{path}` must have exactly {TIER_COUNT} clues, found {found}")]
    Clues {
        /// Asset path.
        path: PathBuf,
        /// Offending category.
        category: String,
        /// Clues found.
        found: usize,
    },
    /// A clue with neither text nor image.
    #[error("clue {index} of category `{category}` in `{path}` has neither text nor image")]
    EmptyClue {
        /// Asset path.
        path: PathBuf,
        /// Offending category.
        category: String,
        /// Zero-based clue index.
        index: usize,
    },
    /// A clue whose answer is missing or not a scalar.
    #[error("clue {index} of category `{category}` in `{path}` has no usable question")]
    MissingAnswer {
        /// Asset path.
        path: PathBuf,
        /// Offending category.
        category: String,
        /// Zero-based clue index.
        index: usize,
    },
}

/// What is shown while a clue is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClueContent {
    /// Plain text, wrapped by the renderer.
    Text(String),
    /// Source code rendered with syntax highlighting.
    Code {
        /// Code snippet.
        source: String,
        /// Language tag understood by the highlighter.
        lang: String,
    },
    /// Picture shown full screen.
    Image {
        /// Image path, resolved against the asset's directory.
        path: PathBuf,
        /// Optional RGB fill behind transparent images.
        background: Option<[u8; 3]>,
    },
}

/// One board cell's content and its expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    /// Content shown during the buzz phase.
    pub content: ClueContent,
    /// Answer shown afterwards.
    pub answer: String,
}

/// A named column of five clues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Category title.
    pub name: String,
    /// Clues ordered by value tier.
    pub clues: Vec<Clue>,
}

/// A full board's worth of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    source: PathBuf,
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct RawClue {
    clue: Option<String>,
    lang: Option<String>,
    image: Option<String>,
    bg: Option<[u8; 3]>,
    question: Option<serde_yaml::Value>,
}

impl CategorySet {
    /// Read and validate the asset at `path`.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let contents = fs::read_to_string(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_yaml_str(path, &contents)?;
        info!(path = %path.display(), "loaded clue set");
        Ok(set)
    }

    /// Parse and validate YAML text; image paths resolve next to `path`.
    pub fn from_yaml_str(path: &Path, contents: &str) -> Result<Self, AssetError> {
        let raw: IndexMap<String, Vec<RawClue>> =
            serde_yaml::from_str(contents).map_err(|source| AssetError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if raw.len() != CATEGORY_COUNT {
            return Err(AssetError::Categories {
                path: path.to_path_buf(),
                found: raw.len(),
            });
        }

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let categories = raw
            .into_iter()
            .map(|(name, clues)| build_category(path, base_dir, name, clues))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: path.to_path_buf(),
            categories,
        })
    }

    /// Asset this set was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Categories in board column order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Clue behind a board cell.
    pub fn clue(&self, pos: CellPos) -> &Clue {
        &self.categories[pos.column].clues[pos.row]
    }
}

fn build_category(
    path: &Path,
    base_dir: &Path,
    name: String,
    clues: Vec<RawClue>,
) -> Result<Category, AssetError> {
    if clues.len() != TIER_COUNT {
        return Err(AssetError::Clues {
            path: path.to_path_buf(),
            category: name,
            found: clues.len(),
        });
    }

    let clues = clues
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let content = if let Some(image) = raw.image {
                ClueContent::Image {
                    path: base_dir.join(image),
                    background: raw.bg,
                }
            } else if let Some(text) = raw.clue {
                match raw.lang {
                    Some(lang) => ClueContent::Code { source: text, lang },
                    None => ClueContent::Text(text),
                }
            } else {
                return Err(AssetError::EmptyClue {
                    path: path.to_path_buf(),
                    category: name.clone(),
                    index,
                });
            };

            let answer = raw
                .question
                .as_ref()
                .and_then(scalar_to_string)
                .ok_or_else(|| AssetError::MissingAnswer {
                    path: path.to_path_buf(),
                    category: name.clone(),
                    index,
                })?;

            Ok(Clue { content, answer })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Category { name, clues })
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
