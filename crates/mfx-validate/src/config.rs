//! Cook configuration: the synthetic input mesh and parameter overrides.

use std::collections::BTreeMap;
use std::ffi::CString;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use mfx_host::{MeshEffect, ParameterType, ParameterValue};
use serde::Deserialize;

/// Value given for a parameter in the config file. Its shape is checked against the
/// parameter's type once the effect is described.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParameterOverride {
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Vector(Vec<f64>),
}

impl ParameterOverride {
    pub fn to_value(&self, kind: ParameterType) -> Result<ParameterValue> {
        let value = match (kind, self) {
            (ParameterType::Integer, ParameterOverride::Int(v)) => {
                ParameterValue::Integer(narrow(*v)?)
            }
            (ParameterType::Choice, ParameterOverride::Int(v)) => ParameterValue::Choice(narrow(*v)?),
            (ParameterType::Boolean, ParameterOverride::Bool(v)) => ParameterValue::Boolean(*v),
            (ParameterType::Boolean, ParameterOverride::Int(v)) => ParameterValue::Boolean(*v != 0),
            (ParameterType::Double, ParameterOverride::Double(v)) => ParameterValue::Double(*v),
            (ParameterType::Double, ParameterOverride::Int(v)) => ParameterValue::Double(*v as f64),
            (ParameterType::Integer2D, ParameterOverride::Vector(v)) => {
                ParameterValue::Integer2D(integers(v)?)
            }
            (ParameterType::Integer3D, ParameterOverride::Vector(v)) => {
                ParameterValue::Integer3D(integers(v)?)
            }
            (ParameterType::Double2D, ParameterOverride::Vector(v)) => {
                ParameterValue::Double2D(doubles(v)?)
            }
            (ParameterType::Double3D, ParameterOverride::Vector(v)) => {
                ParameterValue::Double3D(doubles(v)?)
            }
            (ParameterType::Rgb, ParameterOverride::Vector(v)) => ParameterValue::Rgb(doubles(v)?),
            (ParameterType::Rgba, ParameterOverride::Vector(v)) => ParameterValue::Rgba(doubles(v)?),
            (ParameterType::String, ParameterOverride::Text(v)) => {
                ParameterValue::String(v.clone())
            }
            (ParameterType::Custom, ParameterOverride::Text(v)) => {
                ParameterValue::Custom(v.clone())
            }
            (kind, value) => bail!("{value:?} is not a valid {kind:?} value"),
        };
        Ok(value)
    }
}

fn narrow(value: i64) -> Result<i32> {
    i32::try_from(value).with_context(|| format!("{value} does not fit a 32-bit integer"))
}

fn doubles<const N: usize>(values: &[f64]) -> Result<[f64; N]> {
    <[f64; N]>::try_from(values)
        .with_context(|| format!("expected {N} components, got {}", values.len()))
}

fn integers<const N: usize>(values: &[f64]) -> Result<[i32; N]> {
    let values = doubles::<N>(values)?;
    let mut out = [0; N];
    for (slot, value) in out.iter_mut().zip(values) {
        if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
            bail!("{value} is not a 32-bit integer");
        }
        *slot = value as i32;
    }
    Ok(out)
}

/// What to feed a plug-in when cooking it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CookConfig {
    pub points: Vec<[f32; 3]>,
    /// Polygons as lists of point indices.
    pub faces: Vec<Vec<i32>>,
    pub parameters: BTreeMap<String, ParameterOverride>,
}

impl Default for CookConfig {
    /// A unit quad in the XY plane.
    fn default() -> Self {
        Self {
            points: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            faces: vec![vec![0, 1, 2, 3]],
            parameters: BTreeMap::new(),
        }
    }
}

impl CookConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read cook config {}", path.display()))?;
        let config: CookConfig = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse cook config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects faces that reference points the config does not have.
    pub fn validate(&self) -> Result<()> {
        for (index, face) in self.faces.iter().enumerate() {
            if let Some(point) = face
                .iter()
                .find(|point| usize::try_from(**point).map_or(true, |p| p >= self.points.len()))
            {
                bail!(
                    "face {index} references point {point}, the mesh has {} points",
                    self.points.len()
                );
            }
        }
        Ok(())
    }

    /// Writes every override into the matching parameter of `effect`.
    pub fn apply_parameters(&self, effect: &mut MeshEffect) -> Result<()> {
        for (name, value) in &self.parameters {
            let key = CString::new(name.as_str())
                .with_context(|| format!("invalid parameter name {name:?}"))?;
            let parameter = effect
                .parameters_mut()
                .find_mut(&key)
                .with_context(|| format!("effect has no parameter {name:?}"))?;
            let value = value
                .to_value(parameter.parameter_type())
                .with_context(|| format!("cannot set parameter {name:?}"))?;
            parameter
                .set_value(value)
                .with_context(|| format!("cannot set parameter {name:?}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config_is_a_unit_quad() {
        let config: CookConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CookConfig::default());
        assert_eq!(config.points.len(), 4);
        assert_eq!(config.faces, vec![vec![0, 1, 2, 3]]);
        config.validate().unwrap();
    }

    #[test]
    fn overrides_keep_their_json_shape() {
        let config: CookConfig = serde_json::from_str(
            r#"{
                "points": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
                "faces": [[0, 1, 2]],
                "parameters": {
                    "Count": 3,
                    "Distance": 2.5,
                    "Enable Option": false,
                    "Description": "hello",
                    "Color": [0.1, 0.2, 0.3]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.parameters["Count"], ParameterOverride::Int(3));
        assert_eq!(config.parameters["Distance"], ParameterOverride::Double(2.5));
        assert_eq!(config.parameters["Enable Option"], ParameterOverride::Bool(false));
        assert_eq!(
            config.parameters["Description"],
            ParameterOverride::Text("hello".into())
        );
        assert_eq!(
            config.parameters["Color"],
            ParameterOverride::Vector(vec![0.1, 0.2, 0.3])
        );
    }

    #[test]
    fn overrides_convert_to_the_parameter_type() {
        assert_eq!(
            ParameterOverride::Int(4).to_value(ParameterType::Double).unwrap(),
            ParameterValue::Double(4.0)
        );
        assert_eq!(
            ParameterOverride::Vector(vec![1.0, 2.0])
                .to_value(ParameterType::Integer2D)
                .unwrap(),
            ParameterValue::Integer2D([1, 2])
        );
        assert_eq!(
            ParameterOverride::Int(0).to_value(ParameterType::Boolean).unwrap(),
            ParameterValue::Boolean(false)
        );
    }

    #[test]
    fn mismatched_overrides_are_rejected() {
        assert!(ParameterOverride::Text("x".into())
            .to_value(ParameterType::Integer)
            .is_err());
        assert!(ParameterOverride::Vector(vec![1.0, 2.0])
            .to_value(ParameterType::Rgb)
            .is_err());
        assert!(ParameterOverride::Vector(vec![1.5, 2.0])
            .to_value(ParameterType::Integer2D)
            .is_err());
        assert!(ParameterOverride::Int(i64::MAX)
            .to_value(ParameterType::Integer)
            .is_err());
    }

    #[test]
    fn faces_must_reference_existing_points() {
        let config = CookConfig {
            faces: vec![vec![0, 1, 4]],
            ..CookConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "face 0 references point 4, the mesh has 4 points"
        );
    }
}
