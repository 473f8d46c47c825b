// SPDX-License-Identifier: MIT
//
// Config file — TOML, deserialized with serde.
//
//   effect = "fx1"            # played on start and on Enter
//   autoplay = true
//   seed = 42                 # optional
//   tick_interval_us = 8333
//
//   [colors]
//   text = "#e0e0e0"
//   background = "default"
//
//   [[effects]]               # extra named profiles
//   name = "slow-burn"
//   iterations = 12
//   delay_ms = [50, 200]
//   stagger = { basis = "cell", unit_ms = 20, jitter = [1, 3] }
//   glyphs = "░▒▓█"
//   scramble_color = { random = ["#ff0000", "#00ff00"] }
//   settle_color = "restore"
//   blank_first = true
//
// A missing default file is not an error; a missing explicit one is.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use shuffle_core::effect::{
    self, EffectProfile, EffectRegistry, ProfileError, ScrambleColor, SettleColor, Stagger,
    StaggerBasis,
};
use shuffle_core::palette::Palette;
use shuffle_term::color::{CellColor, ParseColorError};
use thiserror::Error;

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid effect `{name}`")]
    Profile {
        name: String,
        #[source]
        source: ProfileError,
    },

    #[error("invalid color in `{field}`")]
    Color {
        field: String,
        #[source]
        source: ParseColorError,
    },
}

// ─── File Shape ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShuffleConfig {
    pub effect: String,
    pub autoplay: bool,
    pub seed: Option<u64>,
    pub tick_interval_us: u64,
    pub colors: ColorsConfig,
    pub effects: Vec<EffectConfig>,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self {
            effect: effect::FX1.to_owned(),
            autoplay: true,
            seed: None,
            tick_interval_us: 8333,
            colors: ColorsConfig::default(),
            effects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorsConfig {
    pub text: String,
    pub background: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            text: "default".to_owned(),
            background: "default".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectConfig {
    pub name: String,
    pub iterations: u32,
    pub delay_ms: [u64; 2],
    pub stagger: StaggerConfig,
    pub glyphs: String,
    #[serde(default)]
    pub scramble_color: ScrambleColorConfig,
    #[serde(default = "keep")]
    pub settle_color: String,
    #[serde(default = "yes")]
    pub blank_first: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaggerConfig {
    pub basis: BasisConfig,
    pub unit_ms: u64,
    #[serde(default = "no_jitter")]
    pub jitter: [u64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasisConfig {
    Line,
    Cell,
}

/// `"keep"`, a single color, or `{ random = [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScrambleColorConfig {
    Named(String),
    Random { random: Vec<String> },
}

impl Default for ScrambleColorConfig {
    fn default() -> Self {
        Self::Named(keep())
    }
}

fn keep() -> String {
    "keep".to_owned()
}

const fn yes() -> bool {
    true
}

const fn no_jitter() -> [u64; 2] {
    [1, 1]
}

// ─── Loading ────────────────────────────────────────────────────────────────

impl ShuffleConfig {
    /// `$XDG_CONFIG_HOME/shuffle/config.toml` (or the platform equivalent).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shuffle").join("config.toml"))
    }

    /// Load `path`, or the default file if it exists, or the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Base text color captured as every cell's original color.
    pub fn text_color(&self) -> Result<CellColor, ConfigError> {
        parse_color("colors.text", &self.colors.text)
    }

    pub fn background_color(&self) -> Result<CellColor, ConfigError> {
        parse_color("colors.background", &self.colors.background)
    }

    /// The built-in effects plus every `[[effects]]` entry. A configured
    /// effect with a built-in name replaces the built-in.
    pub fn registry(&self) -> Result<EffectRegistry, ConfigError> {
        let mut registry = EffectRegistry::builtin();
        for entry in &self.effects {
            registry.register(entry.to_profile()?);
        }
        Ok(registry)
    }
}

impl EffectConfig {
    pub fn to_profile(&self) -> Result<EffectProfile, ConfigError> {
        let profile_err = |source: ProfileError| ConfigError::Profile {
            name: self.name.clone(),
            source,
        };

        let [min, max] = self.delay_ms;
        let [jmin, jmax] = self.stagger.jitter;
        let basis = match self.stagger.basis {
            BasisConfig::Line => StaggerBasis::Line,
            BasisConfig::Cell => StaggerBasis::Cell,
        };
        let stagger = Stagger::new(basis, self.stagger.unit_ms, jmin..=jmax).map_err(profile_err)?;
        let palette = Palette::from_graphemes(&self.glyphs).map_err(profile_err)?;

        let field = |key: &str| format!("effects.{}.{key}", self.name);
        let scramble = match &self.scramble_color {
            ScrambleColorConfig::Named(s) if s.eq_ignore_ascii_case("keep") => ScrambleColor::Keep,
            ScrambleColorConfig::Named(s) => {
                ScrambleColor::Fixed(parse_color(&field("scramble_color"), s)?)
            }
            ScrambleColorConfig::Random { random } => {
                let colors = random
                    .iter()
                    .map(|c| parse_color(&field("scramble_color"), c))
                    .collect::<Result<Vec<_>, _>>()?;
                ScrambleColor::random(colors).map_err(profile_err)?
            }
        };
        let settle = match self.settle_color.trim() {
            s if s.eq_ignore_ascii_case("restore") => SettleColor::Restore,
            s if s.eq_ignore_ascii_case("keep") => SettleColor::Keep,
            s => SettleColor::Fixed(parse_color(&field("settle_color"), s)?),
        };

        Ok(
            EffectProfile::new(&self.name, self.iterations, min..=max, stagger, palette)
                .map_err(profile_err)?
                .with_scramble_color(scramble)
                .with_settle_color(settle)
                .with_blank_first(self.blank_first),
        )
    }
}

fn parse_color(field: &str, value: &str) -> Result<CellColor, ConfigError> {
    value.parse().map_err(|source| ConfigError::Color {
        field: field.to_owned(),
        source,
    })
}

// ─── Tests ──────────────────────────────────────────────────────────────────
