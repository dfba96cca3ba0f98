//! Named models with initial guesses and parameter bounds.

use std::fmt;

use indexmap::IndexMap;

use crate::model::{library, Model, ModelError};

/// A model together with the starting point and bounds used when fitting it.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDescriptor {
    name: &'static str,
    model: Model,
    guess: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ModelDescriptor {
    /// Returns the name of the model this descriptor refers to, if it differs from its own name.
    pub fn alias_of(&self) -> Option<&'static str> {
        (self.name != self.model.name()).then(|| self.model.name())
    }

    /// Returns the initial guess.
    pub fn guess(&self) -> &[f64] {
        &self.guess
    }

    /// Returns `true` if each parameter lies within its bounds.
    pub fn is_within_bounds(&self, params: &[f64]) -> bool {
        params.len() == self.model.arity()
            && params
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(p, (lower, upper))| lower <= p && p <= upper)
    }

    /// Returns the lower bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Returns the model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the name under which the descriptor is registered.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Creates a new descriptor after checking that the model is well-formed, that the guess and
    /// bounds have one entry per parameter, and that each guess lies within its bounds.
    pub fn new(
        name: &'static str,
        model: Model,
        guess: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidDescriptor {
            name: name.to_string(),
            reason,
        };

        model.validate().map_err(|e| match e {
            ModelError::InvalidModel { reason, .. } => invalid(reason),
            e => invalid(e.to_string()),
        })?;

        for (what, values) in [("guess", &guess), ("lower", &lower), ("upper", &upper)] {
            if values.len() != model.arity() {
                return Err(invalid(format!(
                    "{what} has {} values, but model has {} parameters",
                    values.len(),
                    model.arity()
                )));
            }
            if values.iter().any(|x| !x.is_finite()) {
                return Err(invalid(format!("{what} contains non-finite values")));
            }
        }

        let descriptor = Self {
            name,
            model,
            guess,
            lower,
            upper,
        };

        if !descriptor.is_within_bounds(&descriptor.guess) {
            return Err(invalid("guess does not lie within bounds".to_string()));
        }

        Ok(descriptor)
    }

    /// Returns the upper bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Returns a copy of the descriptor registered under a different name, with new bounds.
    ///
    /// The model and initial guess are unchanged.
    pub fn with_bounds(
        &self,
        name: &'static str,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self, RegistryError> {
        Self::new(name, self.model.clone(), self.guess.clone(), lower, upper)
    }
}

/// A lookup table of model descriptors by name.
///
/// Iteration follows registration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Registry(IndexMap<&'static str, ModelDescriptor>);

impl Registry {
    /// Creates the registry of built-in models.
    ///
    /// Each model in the library is registered under its own name, together with three aliases
    /// with tighter upper bounds on the migration rate.
    pub fn builtin() -> Result<Self, RegistryError> {
        let models = library::all()
            .into_iter()
            .map(|model| (model.name(), model))
            .collect::<IndexMap<_, _>>();
        let model = |name: &str| {
            models
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownModelName(name.to_string()))
        };

        let mut registry = Self::default();

        registry.register(ModelDescriptor::new(
            "trunk_2epoch_sizechange",
            model("trunk_2epoch_sizechange")?,
            vec![1., 1.],
            vec![1e-2, 0.],
            vec![100., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "trunk_3epoch_sizechange",
            model("trunk_3epoch_sizechange")?,
            vec![1., 1., 1.],
            vec![1e-2, 0., 0.],
            vec![100., 10., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "bneck_3params",
            model("bneck_3params")?,
            vec![0.047, 0.042, 0.0096],
            vec![1e-2, 0., 0.],
            vec![100., 10., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "bneck_2params",
            model("bneck_2params")?,
            vec![0.47, 0.0096],
            vec![1e-2, 0.],
            vec![100., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "trunk_2epoch_sizechange_bneck_3param",
            model("trunk_2epoch_sizechange_bneck_3param")?,
            vec![1., 1., 0.042, 0.047, 0.0096],
            vec![1e-2, 0., 0., 1e-2, 0.],
            vec![100., 10., 10., 100., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "trunk_2epoch_sizechange_bneck_2param",
            model("trunk_2epoch_sizechange_bneck_2param")?,
            vec![1., 1., 0.047, 0.0096],
            vec![1e-2, 0., 1e-2, 0.],
            vec![100., 10., 100., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "trunk_3epoch_sizechange_bneck_3param",
            model("trunk_3epoch_sizechange_bneck_3param")?,
            vec![1., 1., 1., 0.042, 0.047, 0.0096],
            vec![1e-2, 0., 0., 0., 1e-2, 0.],
            vec![100., 10., 10., 10., 100., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "trunk_3epoch_sizechange_bneck_2param",
            model("trunk_3epoch_sizechange_bneck_2param")?,
            vec![1., 1., 1., 0.047, 0.0096],
            vec![1e-2, 0., 0., 1e-2, 0.],
            vec![100., 10., 10., 100., 10.],
        )?)?;
        registry.register(ModelDescriptor::new(
            "IM_2params",
            model("IM_2params")?,
            vec![0.25, 1.25e-6],
            vec![1e-4, 0.],
            vec![10., 10.],
        )?)?;
        registry.register_alias(
            "IM_2params_decpriors",
            "IM_2params",
            vec![1e-4, 0.],
            vec![10., 0.1],
        )?;
        registry.register(ModelDescriptor::new(
            "trunk_2epoch_sizechange_IM_2param",
            model("trunk_2epoch_sizechange_IM_2param")?,
            vec![1., 1., 0.25, 1.25e-6],
            vec![1e-2, 0., 1e-4, 0.],
            vec![100., 10., 10., 10.],
        )?)?;
        registry.register_alias(
            "trunk_2epoch_sizechange_IM_2param_decpriors",
            "trunk_2epoch_sizechange_IM_2param",
            vec![1e-2, 0., 1e-4, 0.],
            vec![100., 10., 10., 0.1],
        )?;
        registry.register(ModelDescriptor::new(
            "trunk_3epoch_sizechange_IM_2param",
            model("trunk_3epoch_sizechange_IM_2param")?,
            vec![1., 1., 1., 0.25, 1.25e-6],
            vec![1e-2, 0., 0., 1e-4, 0.],
            vec![100., 10., 10., 10., 10.],
        )?)?;
        // Same bounds as the target
        registry.register_alias(
            "trunk_3epoch_sizechange_IM_2param_decpriors",
            "trunk_3epoch_sizechange_IM_2param",
            vec![1e-2, 0., 0., 1e-4, 0.],
            vec![100., 10., 10., 10., 10.],
        )?;

        log::trace!("Constructed registry with {} models", registry.len());

        Ok(registry)
    }

    /// Returns `true` if the registry contains no models.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the registered descriptors, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.0.values()
    }

    /// Returns the number of registered names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Registers a descriptor under its name.
    pub fn register(&mut self, descriptor: ModelDescriptor) -> Result<(), RegistryError> {
        if self.0.contains_key(descriptor.name) {
            return Err(RegistryError::InvalidDescriptor {
                name: descriptor.name.to_string(),
                reason: "name is already registered".to_string(),
            });
        }

        self.0.insert(descriptor.name, descriptor);
        Ok(())
    }

    /// Registers the model of an existing descriptor under a new name with new bounds.
    pub fn register_alias(
        &mut self,
        name: &'static str,
        target: &str,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<(), RegistryError> {
        let descriptor = self
            .resolve(target)
            .map_err(|_| RegistryError::InvalidDescriptor {
                name: name.to_string(),
                reason: format!("alias target '{target}' is not registered"),
            })?
            .with_bounds(name, lower, upper)?;

        self.register(descriptor)
    }

    /// Returns the descriptor registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&ModelDescriptor, RegistryError> {
        self.0
            .get(name)
            .ok_or_else(|| RegistryError::UnknownModelName(name.to_string()))
    }
}

/// An error associated with the model registry.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryError {
    /// A descriptor violates its invariants.
    InvalidDescriptor {
        /// Name under which the descriptor was to be registered.
        name: String,
        /// Description of the problem.
        reason: String,
    },
    /// No model is registered under the name.
    UnknownModelName(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidDescriptor { name, reason } => {
                write!(f, "invalid model descriptor '{name}': {reason}")
            }
            RegistryError::UnknownModelName(name) => write!(f, "unknown model name '{name}'"),
        }
    }
}

impl std::error::Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::library::FIXED_BOTTLENECK_DURATION;

    #[test]
    fn test_builtin_names_in_order() {
        let registry = Registry::builtin().unwrap();

        let names = registry.iter().map(|d| d.name()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "trunk_2epoch_sizechange",
                "trunk_3epoch_sizechange",
                "bneck_3params",
                "bneck_2params",
                "trunk_2epoch_sizechange_bneck_3param",
                "trunk_2epoch_sizechange_bneck_2param",
                "trunk_3epoch_sizechange_bneck_3param",
                "trunk_3epoch_sizechange_bneck_2param",
                "IM_2params",
                "IM_2params_decpriors",
                "trunk_2epoch_sizechange_IM_2param",
                "trunk_2epoch_sizechange_IM_2param_decpriors",
                "trunk_3epoch_sizechange_IM_2param",
                "trunk_3epoch_sizechange_IM_2param_decpriors",
            ]
        );
    }

    #[test]
    fn test_builtin_descriptors_consistent() {
        let registry = Registry::builtin().unwrap();

        for descriptor in registry.iter() {
            let arity = descriptor.model().arity();
            assert_eq!(descriptor.guess().len(), arity, "{}", descriptor.name());
            assert_eq!(descriptor.lower().len(), arity, "{}", descriptor.name());
            assert_eq!(descriptor.upper().len(), arity, "{}", descriptor.name());
            assert!(descriptor.is_within_bounds(descriptor.guess()));
        }
    }

    #[test]
    fn test_resolve() {
        let registry = Registry::builtin().unwrap();

        let descriptor = registry.resolve("IM_2params").unwrap();
        assert_eq!(descriptor.guess(), [0.25, 1.25e-6]);
        assert_eq!(descriptor.lower(), [1e-4, 0.]);
        assert_eq!(descriptor.upper(), [10., 10.]);
        assert_eq!(descriptor.alias_of(), None);

        let descriptor = registry.resolve("bneck_3params").unwrap();
        assert_eq!(descriptor.guess()[1], FIXED_BOTTLENECK_DURATION);
    }

    #[test]
    fn test_aliases_share_model_and_guess() {
        let registry = Registry::builtin().unwrap();

        for (alias, target, upper) in [
            ("IM_2params_decpriors", "IM_2params", vec![10., 0.1]),
            (
                "trunk_2epoch_sizechange_IM_2param_decpriors",
                "trunk_2epoch_sizechange_IM_2param",
                vec![100., 10., 10., 0.1],
            ),
            (
                "trunk_3epoch_sizechange_IM_2param_decpriors",
                "trunk_3epoch_sizechange_IM_2param",
                vec![100., 10., 10., 10., 10.],
            ),
        ] {
            let alias = registry.resolve(alias).unwrap();
            let target = registry.resolve(target).unwrap();

            assert_eq!(alias.alias_of(), Some(target.name()));
            assert_eq!(alias.model(), target.model());
            assert_eq!(alias.guess(), target.guess());
            assert_eq!(alias.lower(), target.lower());
            assert_eq!(alias.upper(), upper);
        }
    }

    #[test]
    fn test_unknown_name() {
        let registry = Registry::builtin().unwrap();

        assert_eq!(
            registry.resolve("no_such_model"),
            Err(RegistryError::UnknownModelName("no_such_model".to_string()))
        );
    }

    #[test]
    fn test_invalid_descriptors() {
        let model = library::im_2params();

        assert!(matches!(
            ModelDescriptor::new("m", model.clone(), vec![1.], vec![0., 0.], vec![1., 1.]),
            Err(RegistryError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            ModelDescriptor::new("m", model.clone(), vec![2., 0.5], vec![0., 0.], vec![1., 1.]),
            Err(RegistryError::InvalidDescriptor { .. })
        ));
        assert!(ModelDescriptor::new("m", model, vec![0.5, 0.5], vec![0., 0.], vec![1., 1.]).is_ok());
    }

    #[test]
    fn test_register_duplicate_and_dangling_alias() {
        let mut registry = Registry::builtin().unwrap();

        let descriptor = registry.resolve("IM_2params").unwrap().clone();
        assert!(registry.register(descriptor).is_err());

        assert!(matches!(
            registry.register_alias("alias", "no_such_model", vec![], vec![]),
            Err(RegistryError::InvalidDescriptor { .. })
        ));
    }
}
