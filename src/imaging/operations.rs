//! Operation registry and pipelines.
//!
//! A preset lists its transform steps as `name = argument` pairs. This module
//! is the closed set of names those pairs may use: each is parsed into a typed
//! [`Operation`] when the config is loaded, so a typo in a preset is a config
//! error, not a failure halfway through a build.
//!
//! | Name | Argument | Operation |
//! |---|---|---|
//! | `resize`, `thumbnail` | geometry string | [`Operation::Resize`] |
//! | `crop` | `WxH[+X+Y]` | [`Operation::Crop`] |
//! | `rotate` | degrees (multiple of 90) | [`Operation::Rotate`] |
//! | `flip`, `flop` | bool | [`Operation::Flip`], [`Operation::Flop`] |
//! | `grayscale` | bool | [`Operation::Grayscale`] |
//! | `blur` | sigma | [`Operation::Blur`] |
//! | `sharpen` | `true`, sigma or `SIGMAxTHRESHOLD` | [`Operation::Sharpen`] |
//! | `quality` | 1–100 | [`Operation::Quality`] |
//! | `format` | `png`, `jpg`, `gif`, `webp` | [`Operation::Format`] |

use super::backend::{BackendError, ImageBackend};
use super::params::{CropGeometry, Geometry, OutputFormat, ParamError, Quality, Rotation, Sharpening};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Every operation name the registry accepts.
pub const OPERATION_NAMES: &[&str] = &[
    "resize",
    "thumbnail",
    "crop",
    "rotate",
    "flip",
    "flop",
    "grayscale",
    "blur",
    "sharpen",
    "quality",
    "format",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("unknown operation '{0}' (known: {known})", known = OPERATION_NAMES.join(", "))]
    Unknown(String),
    #[error("operation '{operation}': {source}")]
    InvalidArgument {
        operation: String,
        #[source]
        source: ParamError,
    },
    #[error("operation '{operation}' expects {expected}, got {got}")]
    WrongType {
        operation: String,
        expected: &'static str,
        got: String,
    },
}

/// One typed transform step.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Resize(Geometry),
    Crop(CropGeometry),
    Rotate(Rotation),
    Flip,
    Flop,
    Grayscale,
    Blur(f32),
    Sharpen(Sharpening),
    Quality(Quality),
    Format(OutputFormat),
}

impl Operation {
    /// Parse a `name = argument` pair from a preset.
    ///
    /// Returns `Ok(None)` for steps that are switched off (`flip = false`,
    /// `rotate = 0`) so they never reach the pipeline.
    pub fn parse(name: &str, argument: &toml::Value) -> Result<Option<Self>, OperationError> {
        let invalid = |source: ParamError| OperationError::InvalidArgument {
            operation: name.to_string(),
            source,
        };
        let wrong_type = |expected: &'static str| OperationError::WrongType {
            operation: name.to_string(),
            expected,
            got: describe(argument),
        };

        let op = match name {
            "resize" | "thumbnail" => {
                // `resize = 800` is shorthand for a width-only geometry
                let text = match argument {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    _ => return Err(wrong_type("a geometry string")),
                };
                Operation::Resize(text.parse().map_err(invalid)?)
            }
            "crop" => {
                let text = argument.as_str().ok_or_else(|| wrong_type("a crop string"))?;
                Operation::Crop(text.parse().map_err(invalid)?)
            }
            "rotate" => {
                let degrees = match argument {
                    toml::Value::Integer(i) => *i,
                    toml::Value::String(s) => s.trim().parse().map_err(|_| wrong_type("degrees"))?,
                    _ => return Err(wrong_type("degrees")),
                };
                match Rotation::from_degrees(degrees).map_err(invalid)? {
                    Some(rotation) => Operation::Rotate(rotation),
                    None => return Ok(None),
                }
            }
            "flip" | "flop" | "grayscale" => {
                let enabled = argument.as_bool().ok_or_else(|| wrong_type("true or false"))?;
                if !enabled {
                    return Ok(None);
                }
                match name {
                    "flip" => Operation::Flip,
                    "flop" => Operation::Flop,
                    _ => Operation::Grayscale,
                }
            }
            "blur" => {
                let sigma = as_float(argument).ok_or_else(|| wrong_type("a number"))?;
                if !(sigma > 0.0 && sigma.is_finite()) {
                    return Err(wrong_type("a positive number"));
                }
                Operation::Blur(sigma as f32)
            }
            "sharpen" => {
                let text = match argument {
                    toml::Value::Boolean(true) => {
                        return Ok(Some(Operation::Sharpen(Sharpening::light())));
                    }
                    toml::Value::Boolean(false) => return Ok(None),
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    _ => return Err(wrong_type("a sigma")),
                };
                Operation::Sharpen(text.parse().map_err(invalid)?)
            }
            "quality" => {
                let value: i64 = match argument {
                    toml::Value::Integer(i) => *i,
                    toml::Value::String(s) => {
                        s.trim().parse().map_err(|_| wrong_type("an integer 1-100"))?
                    }
                    _ => return Err(wrong_type("an integer 1-100")),
                };
                if value < 0 {
                    return Err(invalid(ParamError::new(
                        "quality",
                        &value.to_string(),
                        "an integer 1-100",
                    )));
                }
                Operation::Quality(Quality::new(value.clamp(0, 100) as u32))
            }
            "format" => {
                let text = argument.as_str().ok_or_else(|| wrong_type("a format name"))?;
                Operation::Format(text.parse().map_err(invalid)?)
            }
            other => return Err(OperationError::Unknown(other.to_string())),
        };
        Ok(Some(op))
    }

    /// Registry name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Resize(_) => "resize",
            Operation::Crop(_) => "crop",
            Operation::Rotate(_) => "rotate",
            Operation::Flip => "flip",
            Operation::Flop => "flop",
            Operation::Grayscale => "grayscale",
            Operation::Blur(_) => "blur",
            Operation::Sharpen(_) => "sharpen",
            Operation::Quality(_) => "quality",
            Operation::Format(_) => "format",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Resize(g) => write!(f, "resize {g}"),
            Operation::Crop(c) => write!(f, "crop {c}"),
            Operation::Rotate(r) => write!(f, "rotate {}", r.degrees()),
            Operation::Blur(sigma) => write!(f, "blur {sigma}"),
            Operation::Sharpen(s) => write!(f, "sharpen {}x{}", s.sigma, s.threshold),
            Operation::Quality(q) => write!(f, "quality {}", q.value()),
            Operation::Format(fmt_) => write!(f, "format {fmt_}"),
            Operation::Flip | Operation::Flop | Operation::Grayscale => f.write_str(self.name()),
        }
    }
}

fn as_float(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn describe(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

/// An ordered, immutable list of operations applied to every image of a preset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    operations: Vec<Operation>,
}

impl Pipeline {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Parse `name = argument` pairs, in order.
    pub fn parse<'a, I>(pairs: I) -> Result<Self, OperationError>
    where
        I: IntoIterator<Item = (&'a str, &'a toml::Value)>,
    {
        let mut operations = Vec::new();
        for (name, argument) in pairs {
            if let Some(op) = Operation::parse(name, argument)? {
                operations.push(op);
            }
        }
        Ok(Self { operations })
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operations.is_empty() {
            return f.write_str("(copy)");
        }
        for (i, op) in self.operations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

/// Open `source`, apply every operation in order, write the result to `output`.
pub fn render(
    backend: &impl ImageBackend,
    source: &Path,
    pipeline: &Pipeline,
    output: &Path,
) -> Result<(), BackendError> {
    let mut image = backend.open(source)?;
    for op in pipeline.operations() {
        backend.apply(&mut image, op)?;
    }
    backend.write(&image, output)
}
