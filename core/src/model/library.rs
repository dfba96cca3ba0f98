//! The built-in demographic models.
//!
//! Models with a truncated ancestral history ("trunk") first change the size of the single
//! ancestral population, either once (two epochs) or twice with a recovery to the reference size
//! (three epochs). Population 2 then either goes through a bottleneck after the split, or the two
//! populations exchange migrants at a symmetric rate.

use super::{
    Event::{self, OnePop, Split, TwoPops},
    Model,
    Value::{self, Fixed, Param},
};

/// Length of the fixed-duration bottleneck, in generations.
pub const BOTTLENECK_GENERATIONS: f64 = 4200.0;

/// Reference effective population size used to scale generations.
pub const REFERENCE_POPULATION_SIZE: f64 = 50_000.0;

/// Length of the fixed-duration bottleneck, in units of `2N` generations.
pub const FIXED_BOTTLENECK_DURATION: f64 =
    BOTTLENECK_GENERATIONS / (2.0 * REFERENCE_POPULATION_SIZE);

const ONE: Value = Fixed(1.0);
const ZERO: Value = Fixed(0.0);

/// Returns all built-in models.
pub fn all() -> Vec<Model> {
    vec![
        trunk_2epoch_sizechange(),
        trunk_3epoch_sizechange(),
        bneck_3params(),
        bneck_2params(),
        trunk_2epoch_sizechange_bneck_3param(),
        trunk_2epoch_sizechange_bneck_2param(),
        trunk_3epoch_sizechange_bneck_3param(),
        trunk_3epoch_sizechange_bneck_2param(),
        im_2params(),
        trunk_2epoch_sizechange_im_2param(),
        trunk_3epoch_sizechange_im_2param(),
    ]
}

fn isolated(duration: Value, nu1: Value, nu2: Value) -> Event<Value> {
    TwoPops {
        duration,
        nu1,
        nu2,
        m12: ZERO,
        m21: ZERO,
    }
}

fn symmetric_migration(duration: Value, nu: Value, m: Value) -> Event<Value> {
    TwoPops {
        duration,
        nu1: nu,
        nu2: nu,
        m12: m,
        m21: m,
    }
}

/// Single population with one instantaneous size change.
///
/// Parameters: `nu_anc_s`, `TB`.
pub fn trunk_2epoch_sizechange() -> Model {
    Model::new_unchecked(
        "trunk_2epoch_sizechange",
        vec!["nu_anc_s", "TB"],
        vec![OnePop {
            duration: Param(1),
            nu: Param(0),
        }],
    )
}

/// Single population with a size change followed by recovery to the reference size.
///
/// Parameters: `nu_anc_s`, `TB`, `TR`.
pub fn trunk_3epoch_sizechange() -> Model {
    Model::new_unchecked(
        "trunk_3epoch_sizechange",
        vec!["nu_anc_s", "TB", "TR"],
        vec![
            OnePop {
                duration: Param(1),
                nu: Param(0),
            },
            OnePop {
                duration: Param(2),
                nu: ONE,
            },
        ],
    )
}

/// Split followed by a bottleneck in population 2 and recovery.
///
/// Parameters: `nu2B`, `TB`, `TF`.
pub fn bneck_3params() -> Model {
    Model::new_unchecked(
        "bneck_3params",
        vec!["nu2B", "TB", "TF"],
        vec![
            Split,
            isolated(Param(1), ONE, Param(0)),
            isolated(Param(2), ONE, ONE),
        ],
    )
}

/// As [`bneck_3params`], with the bottleneck fixed to [`FIXED_BOTTLENECK_DURATION`].
///
/// Parameters: `nu2B`, `TF`.
pub fn bneck_2params() -> Model {
    Model::new_unchecked(
        "bneck_2params",
        vec!["nu2B", "TF"],
        vec![
            Split,
            isolated(Fixed(FIXED_BOTTLENECK_DURATION), ONE, Param(0)),
            isolated(Param(1), ONE, ONE),
        ],
    )
}

/// Ancestral size change, then a split with a bottleneck in population 2.
///
/// Both populations keep the changed ancestral size outside the bottleneck.
///
/// Parameters: `nu_anc_s`, `t_anc_s`, `TB`, `nu2B`, `TF`.
pub fn trunk_2epoch_sizechange_bneck_3param() -> Model {
    Model::new_unchecked(
        "trunk_2epoch_sizechange_bneck_3param",
        vec!["nu_anc_s", "t_anc_s", "TB", "nu2B", "TF"],
        vec![
            OnePop {
                duration: Param(1),
                nu: Param(0),
            },
            Split,
            isolated(Param(2), Param(0), Param(3)),
            isolated(Param(4), Param(0), Param(0)),
        ],
    )
}

/// As [`trunk_2epoch_sizechange_bneck_3param`], with a fixed bottleneck duration.
///
/// Parameters: `nu_anc_s`, `t_anc_s`, `nu2B`, `TF`.
pub fn trunk_2epoch_sizechange_bneck_2param() -> Model {
    Model::new_unchecked(
        "trunk_2epoch_sizechange_bneck_2param",
        vec!["nu_anc_s", "t_anc_s", "nu2B", "TF"],
        vec![
            OnePop {
                duration: Param(1),
                nu: Param(0),
            },
            Split,
            isolated(Fixed(FIXED_BOTTLENECK_DURATION), Param(0), Param(2)),
            isolated(Param(3), Param(0), Param(0)),
        ],
    )
}

/// Ancestral size change and recovery, then a split with a bottleneck in population 2.
///
/// Parameters: `nu_anc_s`, `t_anc_s`, `t_anc_r`, `TB`, `nu2B`, `TF`.
pub fn trunk_3epoch_sizechange_bneck_3param() -> Model {
    Model::new_unchecked(
        "trunk_3epoch_sizechange_bneck_3param",
        vec!["nu_anc_s", "t_anc_s", "t_anc_r", "TB", "nu2B", "TF"],
        vec![
            OnePop {
                duration: Param(1),
                nu: Param(0),
            },
            OnePop {
                duration: Param(2),
                nu: ONE,
            },
            Split,
            isolated(Param(3), ONE, Param(4)),
            isolated(Param(5), ONE, ONE),
        ],
    )
}

/// As [`trunk_3epoch_sizechange_bneck_3param`], with a fixed bottleneck duration.
///
/// Parameters: `nu_anc_s`, `t_anc_s`, `t_anc_r`, `nu2B`, `TF`.
pub fn trunk_3epoch_sizechange_bneck_2param() -> Model {
    Model::new_unchecked(
        "trunk_3epoch_sizechange_bneck_2param",
        vec!["nu_anc_s", "t_anc_s", "t_anc_r", "nu2B", "TF"],
        vec![
            OnePop {
                duration: Param(1),
                nu: Param(0),
            },
            OnePop {
                duration: Param(2),
                nu: ONE,
            },
            Split,
            isolated(Fixed(FIXED_BOTTLENECK_DURATION), ONE, Param(3)),
            isolated(Param(4), ONE, ONE),
        ],
    )
}

/// Split followed by symmetric migration between populations of reference size.
///
/// Parameters: `T`, `m`.
pub fn im_2params() -> Model {
    Model::new_unchecked(
        "IM_2params",
        vec!["T", "m"],
        vec![Split, symmetric_migration(Param(0), ONE, Param(1))],
    )
}

/// Ancestral size change, then a split with symmetric migration at the changed size.
///
/// Parameters: `nu_anc_s`, `t_anc_s`, `T`, `m`.
pub fn trunk_2epoch_sizechange_im_2param() -> Model {
    Model::new_unchecked(
        "trunk_2epoch_sizechange_IM_2param",
        vec!["nu_anc_s", "t_anc_s", "T", "m"],
        vec![
            OnePop {
                duration: Param(1),
                nu: Param(0),
            },
            Split,
            symmetric_migration(Param(2), Param(0), Param(3)),
        ],
    )
}

/// Ancestral size change and recovery, then a split with symmetric migration.
///
/// Parameters: `nu_anc_s`, `t_anc_s`, `t_anc_r`, `T`, `m`.
pub fn trunk_3epoch_sizechange_im_2param() -> Model {
    Model::new_unchecked(
        "trunk_3epoch_sizechange_IM_2param",
        vec!["nu_anc_s", "t_anc_s", "t_anc_r", "T", "m"],
        vec![
            OnePop {
                duration: Param(1),
                nu: Param(0),
            },
            OnePop {
                duration: Param(2),
                nu: ONE,
            },
            Split,
            symmetric_migration(Param(3), ONE, Param(4)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::numerics::DiffusionBackend;

    #[test]
    fn test_fixed_bottleneck_duration() {
        assert_eq!(FIXED_BOTTLENECK_DURATION, 0.042);
    }

    #[test]
    fn test_all_models_valid() {
        let models = all();

        assert_eq!(models.len(), 11);
        for model in models.iter() {
            assert_eq!(model.validate(), Ok(()), "{}", model.name());
        }
    }

    #[test]
    fn test_arity_and_populations() {
        let expected = [
            ("trunk_2epoch_sizechange", 2, 1),
            ("trunk_3epoch_sizechange", 3, 1),
            ("bneck_3params", 3, 2),
            ("bneck_2params", 2, 2),
            ("trunk_2epoch_sizechange_bneck_3param", 5, 2),
            ("trunk_2epoch_sizechange_bneck_2param", 4, 2),
            ("trunk_3epoch_sizechange_bneck_3param", 6, 2),
            ("trunk_3epoch_sizechange_bneck_2param", 5, 2),
            ("IM_2params", 2, 2),
            ("trunk_2epoch_sizechange_IM_2param", 4, 2),
            ("trunk_3epoch_sizechange_IM_2param", 5, 2),
        ];

        for (model, (name, arity, populations)) in all().iter().zip(expected) {
            assert_eq!(model.name(), name);
            assert_eq!(model.arity(), arity, "{name}");
            assert_eq!(model.populations(), populations, "{name}");
        }
    }

    #[test]
    fn test_fixed_bottleneck_specializes_free_bottleneck() {
        let (nu2b, tf) = (0.3, 0.01);

        assert_eq!(
            bneck_3params()
                .resolve(&[nu2b, FIXED_BOTTLENECK_DURATION, tf])
                .unwrap(),
            bneck_2params().resolve(&[nu2b, tf]).unwrap(),
        );

        let backend = DiffusionBackend;
        let free = bneck_3params()
            .evaluate(&backend, &[nu2b, FIXED_BOTTLENECK_DURATION, tf], &[4, 4], 12)
            .unwrap();
        let fixed = bneck_2params()
            .evaluate(&backend, &[nu2b, tf], &[4, 4], 12)
            .unwrap();
        assert_eq!(free, fixed);
    }

    #[test]
    fn test_three_epoch_specializes_two_epoch() {
        let backend = DiffusionBackend;

        let two = trunk_2epoch_sizechange()
            .evaluate(&backend, &[0.5, 0.1], &[6], 20)
            .unwrap();
        let three = trunk_3epoch_sizechange()
            .evaluate(&backend, &[0.5, 0.1, 0.0], &[6], 20)
            .unwrap();

        assert_eq!(two, three);
    }

    #[test]
    fn test_im_2params_evaluates() {
        let sfs = im_2params()
            .evaluate_extrapolated(&DiffusionBackend, &[0.25, 1.25e-6], &[10, 10], &[110, 120, 130])
            .unwrap();

        assert_eq!(sfs.shape().as_ref(), [11, 11]);
        assert!(sfs.inner().iter().all(|x| x.is_finite()));
        assert!(sfs.sum() > 0.0);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let model = trunk_2epoch_sizechange_im_2param();
        let params = [2.0, 0.1, 0.05, 0.5];

        let first = model
            .evaluate_extrapolated(&DiffusionBackend, &params, &[4, 4], &[12, 16, 20])
            .unwrap();
        let second = model
            .evaluate_extrapolated(&DiffusionBackend, &params, &[4, 4], &[12, 16, 20])
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_contraction_reduces_diversity() {
        let backend = DiffusionBackend;
        let model = trunk_2epoch_sizechange();

        let constant = model.evaluate(&backend, &[1.0, 0.5], &[10], 40).unwrap();
        let contracted = model.evaluate(&backend, &[0.1, 0.5], &[10], 40).unwrap();

        assert!(contracted.sum_unmasked() < constant.sum_unmasked());
    }
}
