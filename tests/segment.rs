use dive_planner_deco::{
    DecoError, DiveParameters, Segment, SegmentKind, StopInfo, Tank, TankId, TankSet,
};

fn tanks(params: &DiveParameters) -> (TankSet, TankId, TankId, TankId) {
    let mut tanks = TankSet::new();
    let air = tanks.add("air", Tank::air(params, 12.0, 200.0).unwrap());
    let oxygen = tanks.add("oxygen", Tank::new(params, 1.0, 0.0, 7.0, 200.0).unwrap());
    let trimix = tanks.add("trimix", Tank::new(params, 0.10, 0.70, 12.0, 200.0).unwrap());
    (tanks, air, oxygen, trimix)
}

fn stop() -> StopInfo {
    StopInfo {
        control_compartment: 1,
        gf: 0.3,
        mv_max: 0.8,
    }
}

#[test]
fn test_constant_outside_mod_fails() {
    let params = DiveParameters::default();
    let (tanks, _, oxygen, _) = tanks(&params);

    assert_eq!(
        Segment::constant(&tanks, oxygen, 9.0, 600.0, 0.0),
        Err(DecoError::UnauthorizedMod {
            depth: 9.0,
            min_depth: 0.0,
            max_depth: 6.0
        })
    );
}

#[test]
fn test_constant_shallower_than_min_od_fails() {
    let params = DiveParameters::default();
    let (tanks, _, _, trimix) = tanks(&params);

    assert!(matches!(
        Segment::constant(&tanks, trimix, 3.0, 600.0, 0.0),
        Err(DecoError::UnauthorizedMod { depth: 3.0, .. })
    ));
    assert!(Segment::constant(&tanks, trimix, 60.0, 600.0, 0.0).is_ok());
}

#[test]
fn test_travel_leaving_envelope_fails() {
    let params = DiveParameters::default();
    let (tanks, _, oxygen, trimix) = tanks(&params);

    assert!(matches!(
        Segment::asc_desc(&tanks, oxygen, 0.0, 12.0, 20.0, 0.0),
        Err(DecoError::UnauthorizedMod { depth: 12.0, .. })
    ));
    assert!(matches!(
        Segment::asc_desc(&tanks, trimix, 60.0, 0.0, 10.0, 0.0),
        Err(DecoError::UnauthorizedMod { depth: 0.0, .. })
    ));
}

#[test]
fn test_deco_stop_outside_mod_fails() {
    let params = DiveParameters::default();
    let (tanks, air, oxygen, _) = tanks(&params);

    assert!(Segment::deco(&tanks, oxygen, 9.0, 60.0, 0.0, stop()).is_err());
    assert!(Segment::deco(&tanks, oxygen, 6.0, 60.0, 0.0, stop()).is_ok());
    assert!(Segment::deco(&tanks, air, 70.0, 60.0, 0.0, stop()).is_err());
}

#[test]
fn test_travel_rate_must_be_positive() {
    let params = DiveParameters::default();
    let (tanks, air, _, _) = tanks(&params);

    assert!(matches!(
        Segment::asc_desc(&tanks, air, 0.0, 10.0, 0.0, 0.0),
        Err(DecoError::InvalidParameter { name: "rate", .. })
    ));
}

#[test]
fn test_constant_gas_used() {
    let params = DiveParameters::default();
    let (tanks, air, _, _) = tanks(&params);
    let segment = Segment::constant(&tanks, air, 30.0, 600.0, 0.0).unwrap();

    let expected = params.depth_to_pressure(30.0) * 600.0 * params.dive_consumption_rate / 60.0;
    assert!((segment.gas_used(&params) - expected).abs() < 1e-9);
}

#[test]
fn test_deco_gas_used_uses_deco_rate() {
    let params = DiveParameters::default();
    let (tanks, _, oxygen, _) = tanks(&params);
    let segment = Segment::deco(&tanks, oxygen, 6.0, 120.0, 0.0, stop()).unwrap();

    let expected = params.depth_to_pressure(6.0) * 120.0 * params.deco_consumption_rate / 60.0;
    assert!((segment.gas_used(&params) - expected).abs() < 1e-9);
}

#[test]
fn test_travel_gas_used_at_average_depth() {
    let params = DiveParameters::default();
    let (tanks, air, _, _) = tanks(&params);
    let segment = Segment::asc_desc(&tanks, air, 40.0, 0.0, 10.0, 0.0).unwrap();

    assert_eq!(segment.duration, 240.0);
    let expected = params.depth_to_pressure(20.0) * 240.0 * params.dive_consumption_rate / 60.0;
    assert!((segment.gas_used(&params) - expected).abs() < 1e-9);
    assert_eq!(segment.depth(), 0.0);
    assert!(matches!(segment.kind, SegmentKind::AscDesc { rate, .. } if rate == 10.0));
}

#[test]
fn test_closed_circuit_uses_no_gas() {
    let params = DiveParameters::default();
    let (tanks, air, _, _) = tanks(&params);
    let travel = Segment::asc_desc(&tanks, air, 0.0, 40.0, 20.0, 1.3).unwrap();
    let stop = Segment::deco(&tanks, air, 6.0, 600.0, 1.3, stop()).unwrap();

    assert_eq!(travel.gas_used(&params), 0.0);
    assert_eq!(stop.gas_used(&params), 0.0);
}

#[test]
fn test_end_of_trimix_is_shallower_than_depth() {
    let params = DiveParameters::default();
    let mut tanks = TankSet::new();
    let trimix = tanks.add("tx", Tank::new(&params, 0.18, 0.45, 12.0, 200.0).unwrap());
    let segment = Segment::constant(&tanks, trimix, 60.0, 600.0, 0.0).unwrap();

    let end = segment.end(&params);
    assert!(end > 0.0 && end < 40.0);
}

#[test]
fn test_end_on_closed_circuit() {
    let params = DiveParameters::default();
    let (tanks, air, _, _) = tanks(&params);
    let open = Segment::constant(&tanks, air, 40.0, 600.0, 0.0).unwrap();
    let closed = Segment::constant(&tanks, air, 40.0, 600.0, 1.3).unwrap();

    // loop O2 replaces part of the diluent, but O2 and N2 count the same here
    assert_eq!(open.end(&params), 40.0);
    assert_eq!(closed.end(&params), 40.0);

    let mut narcotic_o2 = params;
    narcotic_o2.narcotic.o2 = 0.5;
    assert!(closed.end(&narcotic_o2) < open.end(&narcotic_o2));
}
