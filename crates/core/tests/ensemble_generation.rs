//! End-to-end ensemble generation against in-memory and fort.22 writers
//!
//! Runs the full pipeline on small synthetic storms: Holland B derivation,
//! bucket selection, member fan-out and output naming.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use nalgebra::Point2;
use storm_ensemble_core::ensemble::{CENTRAL_PRESSURE_NAME, ORIGINAL_NAME};
use storm_ensemble_core::io::TrackWriter;
use storm_ensemble_core::perturbation::{ErrorSeries, SizeClass, StrengthClass};
use storm_ensemble_core::physics::compute_holland_b;
use storm_ensemble_core::{
    AtcfFileProvider, ConfigurationError, DateWindow, EnsembleConfig, EnsembleError,
    EnsembleGenerator, EnsembleMode, Fort22Writer, Knots, MemoryWriter, Millibars, NauticalMiles,
    PerturbedVariable, StormInfo, Track, TrackField, TrackRecord,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 9, 11, 0, 0, 0).unwrap()
}

/// Track with one record every `step_hours`, all sharing the same state
fn storm(count: i64, step_hours: i64, vmax: f64, pc: f64, pb: f64, rmw: f64) -> Track {
    let records = (0..count)
        .map(|i| {
            TrackRecord::new(
                start() + Duration::hours(step_hours * i),
                Point2::new(-65.0 - 0.5 * i as f64, 25.0 + 0.3 * i as f64),
                Knots::new(vmax),
                Millibars::new(pc),
                Millibars::new(pb),
                NauticalMiles::new(rmw),
            )
        })
        .collect();
    let info = StormInfo {
        basin: "AL".to_string(),
        number: 6,
        name: "FLORENCE".to_string(),
    };
    Track::new(info, records).unwrap()
}

fn weak_storm() -> Track {
    storm(3, 12, 40.0, 990.0, 1013.0, 20.0)
}

#[test]
fn test_weak_storm_member_with_unit_factor() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    assert_eq!(generator.strength(), StrengthClass::Weak);

    let plan = generator
        .plan(PerturbedVariable::MaxSustainedWindSpeed)
        .unwrap();
    let member = generator.perturb_member(&[(&plan, 1.0)]).unwrap();

    let wind = member.series(TrackField::MaxSustainedWindSpeed);
    assert_relative_eq!(wind[0], 41.45, max_relative = 1e-12);
    assert_relative_eq!(wind[1], 44.01, max_relative = 1e-12);
    assert_relative_eq!(wind[2], 46.17, max_relative = 1e-12);

    // Pressure follows the wind along the base storm's Holland B
    let b = compute_holland_b(&member).unwrap();
    for (got, want) in b.iter().zip(generator.holland_b()) {
        assert_relative_eq!(*got, *want, max_relative = 1e-9);
    }
    for record in member.records() {
        assert!(*record.central_pressure < 990.0);
        assert_eq!(*record.background_pressure, 1013.0);
        assert_eq!(*record.radius_of_maximum_winds, 20.0);
    }
    assert_eq!(member.records()[1].position, base.records()[1].position);
}

#[test]
fn test_base_track_is_never_modified() {
    let base = weak_storm();
    let snapshot = base.clone();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let writer = MemoryWriter::new();
    let config = EnsembleConfig::new(
        5,
        vec![
            PerturbedVariable::MaxSustainedWindSpeed,
            PerturbedVariable::RadiusOfMaximumWinds,
        ],
    )
    .with_seed(1);

    generator.run(&config, &writer).unwrap();

    assert_eq!(base, snapshot);
    assert_eq!(writer.get(ORIGINAL_NAME).unwrap(), snapshot);
}

#[test]
fn test_outputs_named_per_variable_and_member() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let writer = MemoryWriter::new();
    let config = EnsembleConfig::new(
        3,
        vec![
            PerturbedVariable::MaxSustainedWindSpeed,
            PerturbedVariable::RadiusOfMaximumWinds,
        ],
    )
    .with_seed(5);

    let report = generator.run(&config, &writer).unwrap();

    let names: Vec<&str> = report.outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "wind_speed_1",
            "wind_speed_2",
            "wind_speed_3",
            "radius_of_maximum_winds_1",
            "radius_of_maximum_winds_2",
            "radius_of_maximum_winds_3",
        ]
    );
    assert_eq!(writer.names().len(), 7);
    assert_eq!(report.storm, "AL06 FLORENCE");
    assert_eq!(report.seed, 5);
    assert_eq!(report.strength, StrengthClass::Weak);
    assert_eq!(report.size, SizeClass::Small);

    // Single-variable members leave the other fields alone
    let rmw_member = writer.get("radius_of_maximum_winds_2").unwrap();
    assert_eq!(
        rmw_member.series(TrackField::MaxSustainedWindSpeed),
        base.series(TrackField::MaxSustainedWindSpeed)
    );
    assert_eq!(
        rmw_member.series(TrackField::CentralPressure),
        base.series(TrackField::CentralPressure)
    );
}

#[test]
fn test_members_stay_within_bounds() {
    let intense = storm(11, 12, 160.0, 900.0, 1010.0, 6.0);
    let generator = EnsembleGenerator::new(&intense).unwrap();
    let writer = MemoryWriter::new();
    let config = EnsembleConfig::new(
        50,
        vec![
            PerturbedVariable::MaxSustainedWindSpeed,
            PerturbedVariable::RadiusOfMaximumWinds,
        ],
    )
    .with_seed(99)
    .with_mode(EnsembleMode::Joint);

    let report = generator.run(&config, &writer).unwrap();
    assert_eq!(report.outputs.len(), 50);

    for output in &report.outputs {
        let member = writer.get(&output.name).unwrap();
        for value in member.series(TrackField::MaxSustainedWindSpeed) {
            assert!((25.0..=165.0).contains(&value), "wind {value} out of bounds");
        }
        for value in member.series(TrackField::RadiusOfMaximumWinds) {
            assert!((5.0..=200.0).contains(&value), "rmw {value} out of bounds");
        }
    }
}

#[test]
fn test_same_seed_reproduces_ensemble() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let config = EnsembleConfig::new(
        8,
        vec![
            PerturbedVariable::MaxSustainedWindSpeed,
            PerturbedVariable::RadiusOfMaximumWinds,
        ],
    )
    .with_seed(2018);

    let first = MemoryWriter::new();
    let second = MemoryWriter::new();
    let report_a = generator.run(&config, &first).unwrap();
    let report_b = generator.run(&config, &second).unwrap();

    assert_eq!(report_a, report_b);
    assert_eq!(first.into_tracks(), second.into_tracks());

    let other = MemoryWriter::new();
    let report_c = generator.run(&config.clone().with_seed(2019), &other).unwrap();
    assert_ne!(report_a.outputs, report_c.outputs);
}

#[test]
fn test_joint_members_share_per_variable_draws() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let variables = vec![
        PerturbedVariable::MaxSustainedWindSpeed,
        PerturbedVariable::RadiusOfMaximumWinds,
    ];

    let separate = MemoryWriter::new();
    generator
        .run(&EnsembleConfig::new(4, variables.clone()).with_seed(11), &separate)
        .unwrap();

    let joint = MemoryWriter::new();
    let report = generator
        .run(
            &EnsembleConfig::new(4, variables)
                .with_seed(11)
                .with_mode(EnsembleMode::Joint),
            &joint,
        )
        .unwrap();

    assert_eq!(
        joint.names(),
        vec!["joint_1", "joint_2", "joint_3", "joint_4", "original"]
    );
    assert_eq!(report.outputs[0].perturbations.len(), 2);

    let combined = joint.get("joint_3").unwrap();
    let wind_only = separate.get("wind_speed_3").unwrap();
    let rmw_only = separate.get("radius_of_maximum_winds_3").unwrap();
    assert_eq!(
        combined.series(TrackField::MaxSustainedWindSpeed),
        wind_only.series(TrackField::MaxSustainedWindSpeed)
    );
    assert_eq!(
        combined.series(TrackField::CentralPressure),
        wind_only.series(TrackField::CentralPressure)
    );
    assert_eq!(
        combined.series(TrackField::RadiusOfMaximumWinds),
        rmw_only.series(TrackField::RadiusOfMaximumWinds)
    );
}

#[test]
fn test_radius_factor_extremes_follow_envelope() {
    // 26 nm is about 29.9 statute miles, the 25-35 sm bucket
    let base = storm(5, 12, 70.0, 975.0, 1010.0, 26.0);
    let generator = EnsembleGenerator::new(&base).unwrap();
    assert_eq!(generator.size(), SizeClass::Medium);

    let plan = generator.plan(PerturbedVariable::RadiusOfMaximumWinds).unwrap();
    let ErrorSeries::Range { min, max } = plan.errors.clone() else {
        panic!("radius errors must be a range");
    };

    let at_min = generator.perturb_member(&[(&plan, 1.0)]).unwrap();
    let at_max = generator.perturb_member(&[(&plan, 0.0)]).unwrap();
    let low = at_min.series(TrackField::RadiusOfMaximumWinds);
    let high = at_max.series(TrackField::RadiusOfMaximumWinds);
    for t in 0..base.len() {
        assert_relative_eq!(low[t], 26.0 + min[t], max_relative = 1e-12);
        assert_relative_eq!(high[t], 26.0 + max[t], max_relative = 1e-12);
    }

    // Radius perturbations never touch the pressure-wind pair
    assert_eq!(
        at_min.series(TrackField::CentralPressure),
        base.series(TrackField::CentralPressure)
    );
}

#[test]
fn test_undefined_holland_b_aborts() {
    let mut records = weak_storm().records().to_vec();
    records[2].central_pressure = Millibars::new(1015.0);
    let base = Track::new(StormInfo::default(), records).unwrap();

    match EnsembleGenerator::new(&base) {
        Err(EnsembleError::PhysicalConsistency { record, .. }) => assert_eq!(record, 2),
        other => panic!("expected physical consistency error, got {other:?}"),
    }
}

#[test]
fn test_position_variable_fails_before_any_write() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let writer = MemoryWriter::new();
    let config = EnsembleConfig::new(
        2,
        vec![
            PerturbedVariable::MaxSustainedWindSpeed,
            PerturbedVariable::CrossTrack,
        ],
    );

    let err = generator.run(&config, &writer).unwrap_err();
    assert!(matches!(
        err,
        EnsembleError::Configuration(ConfigurationError::MissingErrorModel(
            PerturbedVariable::CrossTrack
        ))
    ));
    assert!(writer.names().is_empty());
}

#[test]
fn test_zero_members_rejected() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let writer = MemoryWriter::new();
    let err = generator
        .run(
            &EnsembleConfig::new(0, vec![PerturbedVariable::MaxSustainedWindSpeed]),
            &writer,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EnsembleError::Configuration(ConfigurationError::NonPositiveMemberCount(0))
    ));
}

#[test]
fn test_fort22_ensemble_on_disk() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let writer = Fort22Writer::new(dir.path().join("ensemble")).unwrap();
    let config = EnsembleConfig::new(2, vec![PerturbedVariable::MaxSustainedWindSpeed])
        .with_seed(3);

    let report = generator.run(&config, &writer).unwrap();
    let memory = MemoryWriter::new();
    generator.run(&config, &memory).unwrap();

    let original =
        AtcfFileProvider::read_file(&writer.path_for(ORIGINAL_NAME), DateWindow::default())
            .unwrap();
    assert_eq!(
        original.series(TrackField::MaxSustainedWindSpeed),
        base.series(TrackField::MaxSustainedWindSpeed)
    );
    assert_eq!(original.storm(), base.storm());

    for output in &report.outputs {
        let path = writer.path_for(&output.name);
        assert_eq!(path.extension().unwrap(), writer.extension());
        let on_disk = AtcfFileProvider::read_file(&path, DateWindow::default()).unwrap();
        let in_memory = memory.get(&output.name).unwrap();
        for (disk, mem) in on_disk
            .series(TrackField::MaxSustainedWindSpeed)
            .iter()
            .zip(in_memory.series(TrackField::MaxSustainedWindSpeed))
        {
            assert!((disk - mem).abs() <= 0.5);
        }
    }
}

#[test]
fn test_central_pressure_scale_written_with_members() {
    let base = storm(3, 12, 100.0, 950.0, 1010.0, 25.0);
    let generator = EnsembleGenerator::new(&base).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let writer = Fort22Writer::new(dir.path()).unwrap();
    let config = EnsembleConfig::new(2, vec![PerturbedVariable::MaxSustainedWindSpeed])
        .with_seed(11)
        .with_central_pressure_scale(0.9);

    let report = generator.run(&config, &writer).unwrap();
    assert_eq!(report.outputs.len(), 2);
    assert_eq!(
        report.central_pressure.as_ref().map(|s| s.name.as_str()),
        Some(CENTRAL_PRESSURE_NAME)
    );

    let scaled = AtcfFileProvider::read_file(
        &writer.path_for(CENTRAL_PRESSURE_NAME),
        DateWindow::default(),
    )
    .unwrap();
    for (pc, wind) in scaled
        .series(TrackField::CentralPressure)
        .iter()
        .zip(scaled.series(TrackField::MaxSustainedWindSpeed))
    {
        assert_relative_eq!(*pc, 855.0, epsilon = 0.5);
        // Deficit grows from 60 to 155 mb at fixed B
        assert!((wind - 100.0 * (155.0_f64 / 60.0).sqrt()).abs() <= 0.5);
    }
}

#[test]
fn test_central_pressure_scale_only() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let writer = MemoryWriter::new();
    let config = EnsembleConfig::new(4, Vec::new()).with_central_pressure_scale(0.995);

    let report = generator.run(&config, &writer).unwrap();
    assert!(report.outputs.is_empty());
    assert_eq!(writer.names(), vec![CENTRAL_PRESSURE_NAME, ORIGINAL_NAME]);
    assert_eq!(writer.get(ORIGINAL_NAME).unwrap(), base);
}

#[test]
fn test_central_pressure_at_background_fails_before_any_write() {
    let base = weak_storm();
    let generator = EnsembleGenerator::new(&base).unwrap();
    let writer = MemoryWriter::new();
    let config = EnsembleConfig::new(2, vec![PerturbedVariable::MaxSustainedWindSpeed])
        .with_central_pressure_scale(1.1);

    match generator.run(&config, &writer).unwrap_err() {
        EnsembleError::Member { name, source } => {
            assert_eq!(name, CENTRAL_PRESSURE_NAME);
            assert!(matches!(
                *source,
                EnsembleError::PhysicalConsistency { record: 0, .. }
            ));
        }
        other => panic!("expected member error, got {other}"),
    }
    assert!(writer.names().is_empty());
}
