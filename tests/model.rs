use dive_planner_deco::{
    Compartment, DecoError, DiveParameters, Model, ModelError, Segment, Tank, TankSet,
};

const AIR_N2: f64 = 0.79;

fn surface_n2(params: &DiveParameters) -> f64 {
    AIR_N2 * (params.surface_pressure - params.water_vapor_pressure)
}

fn bottom(model: &mut Model, depth: f64, minutes: f64) {
    let pressure = model.params().depth_to_pressure(depth);
    model
        .const_depth(pressure, minutes * 60.0, 0.0, AIR_N2, 0.0)
        .unwrap();
}

#[test]
fn test_new_model_at_surface_equilibrium() {
    let params = DiveParameters::default();
    let model = Model::new(&params).unwrap();

    for (i, compartment) in model.compartments().iter().enumerate() {
        assert_eq!(compartment.number(), i + 1);
        assert_eq!(compartment.pp_he, 0.0);
        assert!((compartment.pp_n2 - surface_n2(&params)).abs() < 1e-12);
    }
    assert_eq!(model.ceiling(), 0.0);
    assert_eq!(model.ox_tox.cns, 0.0);
}

#[test]
fn test_invalid_gradient_factors_rejected() {
    let params = DiveParameters::new(0.3, 1.2);
    assert_eq!(
        Model::new(&params),
        Err(DecoError::InvalidGradientFactor {
            gf_low: 0.3,
            gf_high: 1.2
        })
    );
}

#[test]
fn test_queries_do_not_mutate() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    bottom(&mut model, 40.0, 25.0);
    let before = model;

    let ceiling = model.ceiling();
    let m_value = model.m_value(model.params().depth_to_pressure(15.0));
    let control = model.control_compartment();

    assert_eq!(model.ceiling(), ceiling);
    assert_eq!(model.m_value(model.params().depth_to_pressure(15.0)), m_value);
    assert_eq!(model.control_compartment(), control);
    assert_eq!(model, before);
}

#[test]
fn test_bottom_time_raises_ceiling() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    bottom(&mut model, 40.0, 10.0);
    let short = model.ceiling();
    bottom(&mut model, 40.0, 15.0);
    let long = model.ceiling();

    assert!(short > 0.0);
    assert!(long > short);
}

#[test]
fn test_control_compartment_moves_to_slower_tissues() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    bottom(&mut model, 40.0, 5.0);
    assert_eq!(model.control_compartment(), 1);

    bottom(&mut model, 40.0, 115.0);
    assert!(model.control_compartment() > 1);
}

#[test]
fn test_m_value_ratio_grows_with_loading() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    let surface = model.params().surface_pressure;
    let rested = model.m_value(surface);
    bottom(&mut model, 40.0, 25.0);

    assert!(rested < 1.0);
    assert!(model.m_value(surface) > rested);
}

#[test]
fn test_negative_duration_rejected() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    let before = model;

    assert_eq!(
        model.const_depth(2.0, -1.0, 0.0, AIR_N2, 0.0),
        Err(DecoError::Model(ModelError::NegativeDuration))
    );
    assert_eq!(
        model.asc_desc(1.0, 2.0, -1.0, 0.0, AIR_N2, 0.0),
        Err(DecoError::Model(ModelError::NegativeDuration))
    );
    assert_eq!(
        model.surface_interval(-60.0),
        Err(DecoError::Model(ModelError::NegativeDuration))
    );
    assert_eq!(model, before);
}

#[test]
fn test_zero_duration_travel_is_noop() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    let before = model;
    model.asc_desc(1.0, 4.0, 0.0, 0.0, AIR_N2, 0.0).unwrap();
    assert_eq!(model, before);
}

#[test]
fn test_apply_matches_direct_update() {
    let params = DiveParameters::default();
    let mut tanks = TankSet::new();
    let air = tanks.add("air", Tank::air(&params, 12.0, 200.0).unwrap());

    let descent = Segment::asc_desc(&tanks, air, 0.0, 30.0, 20.0, 0.0).unwrap();
    let level = Segment::constant(&tanks, air, 30.0, 1200.0, 0.0).unwrap();

    let mut replayed = Model::new(&params).unwrap();
    replayed.apply(&descent).unwrap();
    replayed.apply(&level).unwrap();

    let mut direct = Model::new(&params).unwrap();
    let gas = tanks.get(air).unwrap().gas();
    direct
        .asc_desc(
            params.depth_to_pressure(0.0),
            params.depth_to_pressure(30.0),
            90.0,
            gas.f_he,
            gas.f_n2,
            0.0,
        )
        .unwrap();
    direct
        .const_depth(params.depth_to_pressure(30.0), 1200.0, gas.f_he, gas.f_n2, 0.0)
        .unwrap();

    assert_eq!(replayed, direct);
}

#[test]
fn test_closed_circuit_loads_less_nitrogen() {
    let params = DiveParameters::default();
    let pressure = params.depth_to_pressure(30.0);
    let mut open = Model::new(&params).unwrap();
    let mut closed = Model::new(&params).unwrap();

    open.const_depth(pressure, 1800.0, 0.0, AIR_N2, 0.0).unwrap();
    closed.const_depth(pressure, 1800.0, 0.0, AIR_N2, 1.3).unwrap();

    assert!(closed.ceiling() < open.ceiling());
    assert_eq!(closed.ox_tox.max_ppo2, 1.3);
    assert!(closed.ox_tox.otu > open.ox_tox.otu);
}

#[test]
fn test_validate_reports_corrupted_tissue() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    model.compartments_mut()[3].pp_n2 = -1.0;

    assert_eq!(
        model.validate(),
        Err(DecoError::Model(ModelError::CorruptedTissue { compartment: 4 }))
    );
    // loading survives the reset, so the model stays invalid
    assert!(model.validate().is_err());
}

#[test]
fn test_validate_repairs_time_constants() {
    let params = DiveParameters::default();
    let mut model = Model::new(&params).unwrap();
    let mut broken = Compartment::default();
    broken.set_pp(0.0, 0.75);
    model.compartments_mut()[5] = broken;

    assert_eq!(
        model.validate(),
        Err(DecoError::Model(ModelError::ZeroTimeConstant { compartment: 6 }))
    );
    assert_eq!(model.validate(), Ok(()));
    assert_eq!(model.compartments()[5].number(), 6);
    assert_eq!(model.compartments()[5].pp_n2, 0.75);
    assert!(model.compartments()[5].has_time_constants());
}

#[test]
fn test_surface_interval_off_gasses() {
    let params = DiveParameters::default();
    let mut model = Model::new(&params).unwrap();
    bottom(&mut model, 30.0, 30.0);
    let loaded = model.compartments()[15].pp_n2;
    let cns = model.ox_tox.cns;

    model.surface_interval(24.0 * 3600.0).unwrap();

    assert!(model.compartments()[15].pp_n2 < loaded);
    for compartment in model.compartments() {
        assert!((compartment.pp_n2 - surface_n2(&params)).abs() < 0.05);
    }
    assert!(model.ox_tox.cns < cns);
    assert_eq!(model.ox_tox.otu, 0.0);
    assert_eq!(model.ceiling(), 0.0);
}

#[test]
fn test_stored_model_restores() {
    let mut model = Model::new(&DiveParameters::default()).unwrap();
    bottom(&mut model, 30.0, 20.0);

    let json = serde_json::to_string(&model).unwrap();
    let mut restored: Model = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.validate(), Ok(()));
    assert!((restored.ceiling() - model.ceiling()).abs() < 1e-9);
}
